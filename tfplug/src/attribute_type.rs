use crate::types::Dynamic;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(HashMap<String, AttributeType>),
}

impl AttributeType {
    /// Value equality under this type. Sets ignore element order, objects
    /// treat a missing key as null.
    pub fn values_equal(&self, a: &Dynamic, b: &Dynamic) -> bool {
        match (self, a, b) {
            (_, Dynamic::Null, Dynamic::Null) => true,
            (_, Dynamic::Unknown, _) | (_, _, Dynamic::Unknown) => false,
            (AttributeType::Number, Dynamic::Number(x), Dynamic::Number(y)) => {
                (x - y).abs() < f64::EPSILON
            }
            (AttributeType::List(elem), Dynamic::List(xs), Dynamic::List(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| elem.values_equal(x, y))
            }
            (AttributeType::Set(elem), Dynamic::List(xs), Dynamic::List(ys)) => {
                if xs.len() != ys.len() {
                    return false;
                }
                let mut unmatched: Vec<&Dynamic> = ys.iter().collect();
                for x in xs {
                    match unmatched.iter().position(|y| elem.values_equal(x, y)) {
                        Some(pos) => {
                            unmatched.swap_remove(pos);
                        }
                        None => return false,
                    }
                }
                true
            }
            (AttributeType::Map(elem), Dynamic::Map(xs), Dynamic::Map(ys)) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .all(|(k, x)| ys.get(k).is_some_and(|y| elem.values_equal(x, y)))
            }
            (AttributeType::Object(fields), Dynamic::Map(xs), Dynamic::Map(ys)) => {
                fields.iter().all(|(k, field_type)| {
                    let x = xs.get(k).unwrap_or(&Dynamic::Null);
                    let y = ys.get(k).unwrap_or(&Dynamic::Null);
                    field_type.values_equal(x, y)
                })
            }
            _ => a == b,
        }
    }
}
