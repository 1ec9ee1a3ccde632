use crate::types::{Diagnostic, Dynamic};

pub trait Validator: Send + Sync {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Vec<Diagnostic>);
}

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for StringLengthValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(s) = value.as_string() {
            if let Some(min) = self.min {
                if s.len() < min {
                    diagnostics.push(Diagnostic::error(
                        format!("{} must have minimum length of {}", attribute_path, min),
                        format!("Got length {}", s.len()),
                    ));
                }
            }
            if let Some(max) = self.max {
                if s.len() > max {
                    diagnostics.push(Diagnostic::error(
                        format!("{} must have maximum length of {}", attribute_path, max),
                        format!("Got length {}", s.len()),
                    ));
                }
            }
        }
    }
}

pub struct StringPatternValidator {
    pub pattern: regex::Regex,
    pub description: String,
}

impl StringPatternValidator {
    pub fn new(pattern: &str, description: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: regex::Regex::new(pattern)?,
            description: description.to_string(),
        })
    }
}

impl Validator for StringPatternValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(s) = value.as_string() {
            if !self.pattern.is_match(s) {
                diagnostics.push(Diagnostic::error(
                    format!("{} must match {}", attribute_path, self.description),
                    format!("Value '{}' does not match pattern", s),
                ));
            }
        }
    }
}

/// Accepts only the listed string values
pub struct StringOneOfValidator {
    pub values: Vec<String>,
}

impl StringOneOfValidator {
    pub fn new(values: &[&str]) -> Self {
        Self {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl Validator for StringOneOfValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(s) = value.as_string() {
            if !self.values.iter().any(|v| v == s) {
                diagnostics.push(Diagnostic::error(
                    format!(
                        "{} must be one of: {}",
                        attribute_path,
                        self.values.join(", ")
                    ),
                    format!("Got '{}'", s),
                ));
            }
        }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Validator for NumberRangeValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(n) = value.as_number() {
            if let Some(min) = self.min {
                if n < min {
                    diagnostics.push(Diagnostic::error(
                        format!("{} must be at least {}", attribute_path, min),
                        format!("Got {}", n),
                    ));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    diagnostics.push(Diagnostic::error(
                        format!("{} must be at most {}", attribute_path, max),
                        format!("Got {}", n),
                    ));
                }
            }
        }
    }
}

/// Rejects numbers with a fractional part
pub struct WholeNumberValidator;

impl Validator for WholeNumberValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(n) = value.as_number() {
            if n.fract() != 0.0 {
                diagnostics.push(Diagnostic::error(
                    format!("{} must be a whole number", attribute_path),
                    format!("Got {}", n),
                ));
            }
        }
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLengthValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Vec<Diagnostic>) {
        if let Dynamic::List(items) = value {
            if let Some(min) = self.min {
                if items.len() < min {
                    diagnostics.push(Diagnostic::error(
                        format!("{} must have at least {} items", attribute_path, min),
                        format!("Got {} items", items.len()),
                    ));
                }
            }
            if let Some(max) = self.max {
                if items.len() > max {
                    diagnostics.push(Diagnostic::error(
                        format!("{} must have at most {} items", attribute_path, max),
                        format!("Got {} items", items.len()),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_length_validator_accepts_valid_length() {
        let validator = StringLengthValidator {
            min: Some(3),
            max: Some(10),
        };

        let mut diags = Vec::new();
        validator.validate(&Dynamic::from("hello"), "test_field", &mut diags);

        assert!(diags.is_empty());
    }

    #[test]
    fn string_length_validator_rejects_too_short() {
        let validator = StringLengthValidator {
            min: Some(1),
            max: None,
        };

        let mut diags = Vec::new();
        validator.validate(&Dynamic::from(""), "application_name", &mut diags);

        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("minimum length"));
    }

    #[test]
    fn string_pattern_validator_checks_api_version() {
        let validator = StringPatternValidator::new(r"^v\d+\.\d+$", "a version like v3.3").unwrap();

        let mut diags = Vec::new();
        validator.validate(&Dynamic::from("v3.12"), "api_version", &mut diags);
        assert!(diags.is_empty());

        validator.validate(&Dynamic::from("3.3"), "api_version", &mut diags);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn string_one_of_validator() {
        let validator = StringOneOfValidator::new(&["password", "ssh_key"]);

        let mut diags = Vec::new();
        validator.validate(&Dynamic::from("ssh_key"), "type", &mut diags);
        assert!(diags.is_empty());

        validator.validate(&Dynamic::from("x509"), "type", &mut diags);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].summary.contains("password, ssh_key"));
    }

    #[test]
    fn number_range_validator_rejects_out_of_range_port() {
        let validator = NumberRangeValidator {
            min: Some(1.0),
            max: Some(65535.0),
        };

        let mut diags = Vec::new();
        validator.validate(&Dynamic::Number(636.0), "port", &mut diags);
        assert!(diags.is_empty());

        validator.validate(&Dynamic::Number(0.0), "port", &mut diags);
        validator.validate(&Dynamic::Number(70000.0), "port", &mut diags);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn whole_number_validator_rejects_fractions() {
        let mut diags = Vec::new();
        WholeNumberValidator.validate(&Dynamic::Number(636.0), "port", &mut diags);
        assert!(diags.is_empty());

        WholeNumberValidator.validate(&Dynamic::Number(636.9), "port", &mut diags);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "port must be a whole number");
    }

    #[test]
    fn list_length_validator_rejects_empty_list() {
        let validator = ListLengthValidator {
            min: Some(1),
            max: None,
        };

        let mut diags = Vec::new();
        validator.validate(&Dynamic::List(vec![]), "paths", &mut diags);

        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn validators_ignore_other_types() {
        let validator = NumberRangeValidator {
            min: Some(1.0),
            max: None,
        };

        let mut diags = Vec::new();
        validator.validate(&Dynamic::Unknown, "port", &mut diags);
        validator.validate(&Dynamic::Null, "port", &mut diags);

        assert!(diags.is_empty());
    }
}
