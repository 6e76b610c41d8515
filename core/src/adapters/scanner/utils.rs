pub struct Utils;

impl Utils {
    /// Split a network field into its local address and port.
    ///
    /// The split happens on the last colon so bracketed IPv6 literals keep
    /// their colons on the address side. For connected sockets
    /// (`local->remote`) only the local side is considered.
    ///
    /// - "127.0.0.1:3000" → ("127.0.0.1", 3000)
    /// - "\[::1]:8080"    → ("\[::1]", 8080)
    /// - "*:53" or ":53"  → ("*", 53)
    ///
    /// Returns `None` when the port is missing, a wildcard or not a number.
    pub fn parse_address(field: &str) -> Option<(String, u16)> {
        let local = field.split("->").next().unwrap_or(field).trim();
        let last_colon = local.rfind(':')?;
        let addr = &local[..last_colon];
        let port = Self::parse_decimal(&local[last_colon + 1..])?;
        let addr = if addr.is_empty() || addr == "*" { "*" } else { addr };
        Some((addr.to_string(), port))
    }

    /// Parse a PID, rejecting zero.
    pub fn parse_pid(value: &str) -> Option<u32> {
        Self::parse_decimal::<u32>(value).filter(|pid| *pid > 0)
    }

    /// Parse an unsigned decimal made of ASCII digits only ("+80" is rejected).
    fn parse_decimal<T: std::str::FromStr>(value: &str) -> Option<T> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        value.parse().ok()
    }
}
