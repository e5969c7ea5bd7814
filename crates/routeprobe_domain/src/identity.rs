use crate::PartitionLabel;

/// The AWS account behind a configured credential profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountIdentity {
    pub partition: PartitionLabel,
    pub profile: String,
    pub account_id: String,
}

impl AccountIdentity {
    pub fn new(partition: PartitionLabel, profile: impl ToString, account_id: impl ToString) -> Self {
        Self { partition, profile: profile.to_string(), account_id: account_id.to_string() }
    }

    /// Account id reduced to its last four digits, e.g. `...1234`.
    pub fn masked_id(&self) -> String {
        let chars: Vec<char> = self.account_id.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("...{tail}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_masked_id() {
        let fixture = AccountIdentity::new("ACCOUNT1".into(), "default", "123456789012");
        assert_eq!(fixture.masked_id(), "...9012");
    }

    #[test]
    fn test_masked_short_id() {
        let fixture = AccountIdentity::new("ACCOUNT1".into(), "default", "12");
        assert_eq!(fixture.masked_id(), "...12");
    }
}
