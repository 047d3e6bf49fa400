//! Cookie header parsing.
//!
//! The anti-forgery token travels as a cookie, so the client needs to read
//! one named cookie out of the raw `Cookie` header text exposed by the
//! transport's cookie store. The name is matched literally: every regex
//! metacharacter is escaped first, so a crafted cookie name cannot widen
//! the match.

use regex::Regex;

/// Returns the decoded value of the first cookie named `name` in
/// `cookie_header` (a `name=value; other=value` string), or `None` if
/// absent. Pure and synchronous.
pub fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    let pattern = format!("(?:^|; ?){}=([^;]*)", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let captures = re.captures(cookie_header)?;
    Some(percent_decode(captures.get(1)?.as_str()))
}

/// Decodes `%XX` escape sequences, leaving malformed sequences untouched.
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Some(byte) = decode_hex_pair(bytes[i + 1], bytes[i + 2]) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn decode_hex_pair(high: u8, low: u8) -> Option<u8> {
    let high = (high as char).to_digit(16)?;
    let low = (low as char).to_digit(16)?;
    Some((high * 16 + low) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_first_matching_cookie() {
        let header = "csrftoken=abc123; sessionid=xyz";
        assert_eq!(get_cookie(header, "csrftoken"), Some("abc123".to_string()));
        assert_eq!(get_cookie(header, "sessionid"), Some("xyz".to_string()));
    }

    #[test]
    fn test_absent_cookie_returns_none() {
        assert_eq!(get_cookie("a=1; b=2", "c"), None);
        assert_eq!(get_cookie("", "a"), None);
    }

    #[test]
    fn test_name_is_matched_literally() {
        // A dot in the name must not act as a wildcard
        let header = "tokenX=wrong; token.=right";
        assert_eq!(get_cookie(header, "token."), Some("right".to_string()));

        // Metacharacter-heavy names must not panic or mismatch
        let header = "we(ird)*name=v";
        assert_eq!(get_cookie(header, "we(ird)*name"), Some("v".to_string()));
        assert_eq!(get_cookie(header, "we(ird)+name"), None);
    }

    #[test]
    fn test_name_must_not_match_suffix() {
        let header = "xtoken=wrong; token=right";
        assert_eq!(get_cookie(header, "token"), Some("right".to_string()));
    }

    #[test]
    fn test_value_is_percent_decoded() {
        let header = "note=hello%20world%21";
        assert_eq!(get_cookie(header, "note"), Some("hello world!".to_string()));
    }

    #[test]
    fn test_malformed_escapes_pass_through() {
        assert_eq!(percent_decode("50%"), "50%");
        assert_eq!(percent_decode("a%zzb"), "a%zzb");
    }
}
