use crate::parser::Mode;
use crate::url::{Field, Url, UrlError};

macro_rules! test {
    // expected fields, in SCHEMA/USERINFO/HOST/PORT/PATH/QUERY/FRAGMENT order
    {
        $input:literal $(, connect = $connect:literal)?;
        $($field:ident => $expect:literal),* $(,)?
        $(; port = $port:literal)?
    } => {
        let buf = &$input[..];
        #[allow(unused_mut, unused_assignments)]
        let mut connect = false;
        $(connect = $connect;)?
        let url = match Url::parse(buf, connect) {
            Ok(url) => url,
            Err(err) => panic!("{:?} failed to parse: {err:?}", buf),
        };

        let mut expected_set = 0u8;
        $(
            expected_set |= 1 << Field::$field as u8;
            assert_eq!(
                url.slice(Field::$field, buf),
                Some(&$expect[..]),
                "field {:?} of {:?}",
                Field::$field,
                buf,
            );
        )*
        for field in [
            Field::Schema,
            Field::Userinfo,
            Field::Host,
            Field::Port,
            Field::Path,
            Field::Query,
            Field::Fragment,
        ] {
            if expected_set & (1 << field as u8) == 0 {
                assert!(!url.is_set(field), "unexpected {field:?} in {buf:?}");
            }
        }
        $(assert_eq!(url.port(), $port);)?
    };
    (#[error] $input:literal $(, connect = $connect:literal)?) => {
        #[allow(unused_mut, unused_assignments)]
        let mut connect = false;
        $(connect = $connect;)?
        assert!(
            Url::parse(&$input[..], connect).is_err(),
            "{:?} unexpectedly parsed",
            &$input[..],
        );
    };
}

#[test]
fn dissect_origin_form() {
    test! {
        b"/";
        Path => b"/"
    };
    test! {
        b"*";
        Path => b"*"
    };
    test! {
        b"/search?q=rust#results";
        Path => b"/search",
        Query => b"q=rust",
        Fragment => b"results"
    };
    test! {
        b"/a??b";
        Path => b"/a",
        Query => b"?b"
    };
    test! {
        b"/p%20ath";
        Path => b"/p%20ath"
    };
}

#[test]
fn dissect_absolute_form() {
    test! {
        b"http://example.com";
        Schema => b"http",
        Host => b"example.com"
    };
    test! {
        b"http://example.com/";
        Schema => b"http",
        Host => b"example.com",
        Path => b"/"
    };
    test! {
        b"https://example.com:8080/p?q=1";
        Schema => b"https",
        Host => b"example.com",
        Port => b"8080",
        Path => b"/p",
        Query => b"q=1";
        port = 8080
    };
    test! {
        b"http://u:p@example.com/";
        Schema => b"http",
        Userinfo => b"u:p",
        Host => b"example.com",
        Path => b"/"
    };
}

#[test]
fn dissect_ipv6_literal() {
    test! {
        b"http://u:p@[::1]:8080/a?b#c";
        Schema => b"http",
        Userinfo => b"u:p",
        Host => b"::1",
        Port => b"8080",
        Path => b"/a",
        Query => b"b",
        Fragment => b"c";
        port = 8080
    };
    test! {
        b"http://[2001:db8::7]/";
        Schema => b"http",
        Host => b"2001:db8::7",
        Path => b"/"
    };
    test!(#[error] b"http://[::1/");
}

#[test]
fn dissect_connect_form() {
    test! {
        b"example.com:443", connect = true;
        Host => b"example.com",
        Port => b"443";
        port = 443
    };
    // CONNECT accepts host:port and nothing else
    test!(#[error] b"example.com", connect = true);
    test!(#[error] b"/path", connect = true);
    test!(#[error] b"http://example.com:443/", connect = true);
}

#[test]
fn rejects() {
    test!(#[error] b"http://");
    test!(#[error] b"http:///toto");
    test!(#[error] b"http://a@b@c/");
    test!(#[error] b"http://example.com:99999/");
    test!(#[error] b"/with space");
    test!(#[error] b"/line\nbreak");
}

#[test]
fn empty_input_has_no_fields() {
    let url = Url::parse(b"", false).unwrap();
    for field in [
        Field::Schema,
        Field::Userinfo,
        Field::Host,
        Field::Port,
        Field::Path,
        Field::Query,
        Field::Fragment,
    ] {
        assert!(!url.is_set(field));
    }
    assert_eq!(url.port(), 0);
}

#[test]
fn strict_mode_differences() {
    // lenient admits '_' in reg-names and HTAB in paths
    assert!(Url::parse(b"http://foo_bar/", false).is_ok());
    assert!(matches!(
        Url::parse_with(b"http://foo_bar/", false, Mode::Strict),
        Err(UrlError::Host)
    ));

    assert!(Url::parse(b"/a\tb", false).is_ok());
    assert!(matches!(
        Url::parse_with(b"/a\tb", false, Mode::Strict),
        Err(UrlError::Char)
    ));
}

#[test]
fn port_bounds() {
    let buf = b"http://h:65535/";
    assert_eq!(Url::parse(buf, false).unwrap().port(), 65535);
    assert!(matches!(
        Url::parse(b"http://h:65536/", false),
        Err(UrlError::Port)
    ));
}

/// Reassembling the fields with their canonical delimiters reproduces
/// the input.
#[test]
fn round_trip() {
    let inputs: &[&[u8]] = &[
        b"/",
        b"/search?q=rust#results",
        b"http://example.com",
        b"http://example.com/",
        b"https://u:p@example.com:8080/p/q?r=s#t",
        b"http://u:p@[::1]:8080/a?b#c",
    ];

    for input in inputs {
        let url = Url::parse(input, false).unwrap();
        let mut out = Vec::new();

        if let Some(schema) = url.slice(Field::Schema, input) {
            out.extend_from_slice(schema);
            out.extend_from_slice(b"://");
        }
        if let Some(userinfo) = url.slice(Field::Userinfo, input) {
            out.extend_from_slice(userinfo);
            out.push(b'@');
        }
        if let Some(host) = url.slice(Field::Host, input) {
            let (off, _) = url.span(Field::Host).unwrap();
            let v6 = off > 0 && input[off - 1] == b'[';
            if v6 {
                out.push(b'[');
            }
            out.extend_from_slice(host);
            if v6 {
                out.push(b']');
            }
        }
        if let Some(port) = url.slice(Field::Port, input) {
            out.push(b':');
            out.extend_from_slice(port);
        }
        if let Some(path) = url.slice(Field::Path, input) {
            out.extend_from_slice(path);
        }
        if let Some(query) = url.slice(Field::Query, input) {
            out.push(b'?');
            out.extend_from_slice(query);
        }
        if let Some(fragment) = url.slice(Field::Fragment, input) {
            out.push(b'#');
            out.extend_from_slice(fragment);
        }

        assert_eq!(out, *input, "round trip of {input:?}");
    }
}
