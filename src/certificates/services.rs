use uuid::Uuid;

pub const CODE_PREFIX: &str = "NL-";
pub const CODE_HEX_LEN: usize = 12;

/// `NL-` plus the first 12 hex digits of a random v4 UUID, uppercased.
pub fn generate_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{CODE_PREFIX}{}", hex[..CODE_HEX_LEN].to_uppercase())
}

#[cfg(test)]
pub fn is_valid_code(code: &str) -> bool {
    code.strip_prefix(CODE_PREFIX).is_some_and(|rest| {
        rest.len() == CODE_HEX_LEN
            && rest
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    })
}
