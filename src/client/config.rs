use crate::macros::builder_setters;
use std::time::Duration;

/// Tunables recognised by the session core.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Longest the session may sit in OPEN waiting for a bind response
    /// before the transport is forcibly closed.
    pub bind_timeout: Duration,
    /// Period of the enquire_link keepalive while bound.
    pub enquire_link_interval: Duration,
    /// Split messages over 140 bytes using the SAR optional parameters.
    pub send_multipart_sar: bool,
    /// Split messages over 140 bytes by prepending a user data header.
    /// Only consulted when SAR splitting is off.
    pub send_multipart_udh: bool,
    /// Move single-segment messages over 254 bytes into the
    /// message_payload optional parameter.
    pub send_long_messages: bool,
    /// First reconnect delay. The core never reconnects itself; this rides
    /// along for whatever supervises the session.
    pub initial_reconnect_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bind_timeout: Duration::from_secs(30),
            enquire_link_interval: Duration::from_secs(55),
            send_multipart_sar: false,
            send_multipart_udh: false,
            send_long_messages: false,
            initial_reconnect_delay: Duration::from_secs(5),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    builder_setters! {
        bind_timeout: Duration,
        enquire_link_interval: Duration,
        send_multipart_sar: bool,
        send_multipart_udh: bool,
        send_long_messages: bool,
        initial_reconnect_delay: Duration,
    }
}
