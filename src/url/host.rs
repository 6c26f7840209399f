use crate::matches;

use super::{Field, Span, Url, UrlError};

/// Authority sub-machine state, separate from the main state set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HostState {
    Dead,
    UserinfoStart,
    Userinfo,
    HostStart,
    HostV6Start,
    Host,
    HostV6,
    HostV6End,
    PortStart,
    Port,
}

pub(crate) fn parse_host_char(s: HostState, ch: u8, strict: bool) -> HostState {
    match s {
        HostState::Userinfo | HostState::UserinfoStart => {
            if ch == b'@' {
                return HostState::HostStart;
            }
            if matches::is_userinfo_char(ch) {
                return HostState::Userinfo;
            }
        }

        HostState::HostStart => {
            if ch == b'[' {
                return HostState::HostV6Start;
            }
            if matches::is_host_char(ch, strict) {
                return HostState::Host;
            }
        }

        HostState::Host => {
            if matches::is_host_char(ch, strict) {
                return HostState::Host;
            }
            if ch == b':' {
                return HostState::PortStart;
            }
        }

        HostState::HostV6End => {
            if ch == b':' {
                return HostState::PortStart;
            }
        }

        HostState::HostV6 => {
            if ch == b']' {
                return HostState::HostV6End;
            }
            if matches::is_hex(ch) || ch == b':' || ch == b'.' {
                return HostState::HostV6;
            }
        }

        HostState::HostV6Start => {
            if matches::is_hex(ch) || ch == b':' || ch == b'.' {
                return HostState::HostV6;
            }
        }

        HostState::Port | HostState::PortStart => {
            if matches::is_num(ch) {
                return HostState::Port;
            }
        }

        HostState::Dead => {}
    }
    HostState::Dead
}

/// Re-scan the authority span tagged HOST by the URL field scan,
/// splitting it into USERINFO, HOST (reg-name or v6 literal interior) and
/// PORT spans.
pub(super) fn parse_host(
    buf: &[u8],
    url: &mut Url,
    found_at: bool,
    strict: bool,
) -> Result<(), UrlError> {
    let span = url.fields[Field::Host as usize];
    let start = span.off as usize;
    let end = start + span.len as usize;

    url.fields[Field::Host as usize].len = 0;

    let mut s = if found_at {
        HostState::UserinfoStart
    } else {
        HostState::HostStart
    };

    for (i, &ch) in buf[start..end].iter().enumerate() {
        let i = start + i;
        let new_s = parse_host_char(s, ch, strict);

        match new_s {
            HostState::Dead => return Err(UrlError::Host),

            HostState::Host => {
                if s != HostState::Host {
                    url.fields[Field::Host as usize].off = i as u16;
                }
                url.fields[Field::Host as usize].len += 1;
            }

            HostState::HostV6 => {
                if s != HostState::HostV6 {
                    url.fields[Field::Host as usize].off = i as u16;
                }
                url.fields[Field::Host as usize].len += 1;
            }

            HostState::Port => {
                if s != HostState::Port {
                    url.fields[Field::Port as usize] = Span {
                        off: i as u16,
                        len: 0,
                    };
                    url.field_set |= super::bit(Field::Port);
                }
                url.fields[Field::Port as usize].len += 1;
            }

            HostState::Userinfo => {
                if s != HostState::Userinfo {
                    url.fields[Field::Userinfo as usize] = Span {
                        off: i as u16,
                        len: 0,
                    };
                    url.field_set |= super::bit(Field::Userinfo);
                }
                url.fields[Field::Userinfo as usize].len += 1;
            }

            _ => {}
        }

        s = new_s;
    }

    // a run left hanging mid-field is a hard failure
    match s {
        HostState::HostStart
        | HostState::HostV6Start
        | HostState::HostV6
        | HostState::PortStart
        | HostState::Userinfo
        | HostState::UserinfoStart => Err(UrlError::Host),
        _ => Ok(()),
    }
}
