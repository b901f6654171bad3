//! Identifier extraction helpers.
//!
//! Entities can be referenced either by their raw numeric identifier or by a
//! platform mention token:
//!
//! - users and members: `<@ID>` or `<@!ID>`
//! - channels: `<#ID>`

/// Parses a raw numeric identifier.
///
/// # Examples
///
/// ```
/// # use chatcmd::utils::parse_id;
/// assert_eq!(parse_id("42"), Some(42));
/// assert_eq!(parse_id("-42"), None);
/// ```
pub fn parse_id(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok()
}

/// Extracts a user identifier from `<@ID>`, `<@!ID>` or a raw identifier.
///
/// # Examples
///
/// ```
/// # use chatcmd::utils::parse_user_id;
/// assert_eq!(parse_user_id("<@!42>"), Some(42));
/// assert_eq!(parse_user_id("<@42>"), Some(42));
/// assert_eq!(parse_user_id("42"), Some(42));
/// assert_eq!(parse_user_id("bob"), None);
/// ```
pub fn parse_user_id(raw: &str) -> Option<u64> {
    match raw.strip_prefix("<@") {
        Some(mention) => {
            let mention = mention.strip_prefix('!').unwrap_or(mention);
            parse_id(mention.strip_suffix('>')?)
        }
        None => parse_id(raw),
    }
}

/// Extracts a channel identifier from `<#ID>` or a raw identifier.
///
/// # Examples
///
/// ```
/// # use chatcmd::utils::parse_channel_id;
/// assert_eq!(parse_channel_id("<#42>"), Some(42));
/// assert_eq!(parse_channel_id("42"), Some(42));
/// assert_eq!(parse_channel_id("<@42>"), None);
/// ```
pub fn parse_channel_id(raw: &str) -> Option<u64> {
    match raw.strip_prefix("<#") {
        Some(mention) => parse_id(mention.strip_suffix('>')?),
        None => parse_id(raw),
    }
}
