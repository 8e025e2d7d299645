use super::referral::ReferralFields;

/// Predicate passed to a record store's read operation.
///
/// Stores render it into their own query language; see
/// `AirtableStore::formula` for the `{field} = 'value'` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Field equals a string value
    Equals { field: String, value: String },
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Evaluate against a row held in memory
    pub fn matches(&self, fields: &ReferralFields) -> bool {
        match self {
            Filter::Equals { field, value } => {
                fields.field_value(field).as_deref() == Some(value.as_str())
            }
        }
    }
}
