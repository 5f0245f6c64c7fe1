use serde::{Deserialize, Serialize};

/// Availability of a single copy. Stored as the `is_borrowed` flag.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Available,
    Borrowed,
}

impl BookStatus {
    pub fn is_borrowed(&self) -> bool {
        matches!(self, BookStatus::Borrowed)
    }
}

impl From<bool> for BookStatus {
    fn from(is_borrowed: bool) -> Self {
        if is_borrowed {
            Self::Borrowed
        } else {
            Self::Available
        }
    }
}

#[cfg(test)]
mod test {
    use super::BookStatus;

    #[test]
    fn flag_conversion() {
        assert_eq!(BookStatus::from(true), BookStatus::Borrowed);
        assert_eq!(BookStatus::from(false), BookStatus::Available);
        assert!(BookStatus::Borrowed.is_borrowed());
        assert!(!BookStatus::default().is_borrowed());
    }

    #[test]
    fn serialized_lowercase() {
        let json = serde_json::to_string(&BookStatus::Borrowed).unwrap();
        assert_eq!(json, "\"borrowed\"");
        let status: BookStatus = serde_json::from_str("\"available\"").unwrap();
        assert_eq!(status, BookStatus::Available);
    }
}
