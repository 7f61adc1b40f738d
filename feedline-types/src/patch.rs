/// Three-state update field for partial updates.
///
/// The HTTP layer keeps the legacy wire convention (a field that is absent
/// means "leave unchanged", an empty string on a nullable column means
/// "clear to NULL") but everything past the request boundary works with
/// this explicit wrapper so the two signals can never be conflated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Leave the stored value unchanged.
    #[default]
    Keep,
    /// Clear the stored value to NULL.
    Clear,
    /// Replace the stored value.
    Set(T),
}

impl Patch<String> {
    /// Wire convention for nullable columns: absent keeps, empty clears.
    pub fn nullable(value: Option<String>) -> Self {
        match value {
            None => Patch::Keep,
            Some(s) if s.is_empty() => Patch::Clear,
            Some(s) => Patch::Set(s),
        }
    }

    /// Wire convention for NOT NULL text columns: an empty string is a
    /// real value, only absence keeps the stored one.
    pub fn required(value: Option<String>) -> Self {
        match value {
            None => Patch::Keep,
            Some(s) => Patch::Set(s),
        }
    }
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_distinguishes_absent_from_empty() {
        assert_eq!(Patch::nullable(None), Patch::Keep);
        assert_eq!(Patch::nullable(Some(String::new())), Patch::Clear);
        assert_eq!(
            Patch::nullable(Some("Product".to_string())),
            Patch::Set("Product".to_string())
        );
    }

    #[test]
    fn required_keeps_empty_string_as_value() {
        assert_eq!(Patch::required(None), Patch::Keep);
        assert_eq!(
            Patch::required(Some(String::new())),
            Patch::Set(String::new())
        );
    }
}
