/// HTTP request [Method][rfc].
///
/// [rfc]: <https://datatracker.ietf.org/doc/html/rfc9110#name-methods>
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Method(Inner);

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
enum Inner {
    #[default]
    Delete,
    Get,
    Head,
    Post,
    Put,
    Connect,
    Options,
    Trace,
    Copy,
    Lock,
    Mkcol,
    Move,
    Propfind,
    Proppatch,
    Unlock,
    Report,
    Mkactivity,
    Checkout,
    Merge,
    MSearch,
    Notify,
    Subscribe,
    Unsubscribe,
    Patch,
}

impl Method {
    forward! {
        /// The `DELETE` method deletes the specified resource.
        pub const DELETE: Delete = "DELETE";
        /// The `GET` method requests a representation of the specified resource.
        pub const GET: Get = "GET";
        /// The `HEAD` method asks for a GET response without the response body.
        pub const HEAD: Head = "HEAD";
        /// The `POST` method submits an entity to the specified resource.
        pub const POST: Post = "POST";
        /// The `PUT` method replaces the target resource with the request content.
        pub const PUT: Put = "PUT";
        /// The `CONNECT` method establishes a tunnel to the target host.
        pub const CONNECT: Connect = "CONNECT";
        /// The `OPTIONS` method describes the communication options for the target.
        pub const OPTIONS: Options = "OPTIONS";
        /// The `TRACE` method performs a message loop-back test.
        pub const TRACE: Trace = "TRACE";
        /// WebDAV `COPY`.
        pub const COPY: Copy = "COPY";
        /// WebDAV `LOCK`.
        pub const LOCK: Lock = "LOCK";
        /// WebDAV `MKCOL`.
        pub const MKCOL: Mkcol = "MKCOL";
        /// WebDAV `MOVE`.
        pub const MOVE: Move = "MOVE";
        /// WebDAV `PROPFIND`.
        pub const PROPFIND: Propfind = "PROPFIND";
        /// WebDAV `PROPPATCH`.
        pub const PROPPATCH: Proppatch = "PROPPATCH";
        /// WebDAV `UNLOCK`.
        pub const UNLOCK: Unlock = "UNLOCK";
        /// WebDAV versioning `REPORT`.
        pub const REPORT: Report = "REPORT";
        /// WebDAV versioning `MKACTIVITY`.
        pub const MKACTIVITY: Mkactivity = "MKACTIVITY";
        /// WebDAV versioning `CHECKOUT`.
        pub const CHECKOUT: Checkout = "CHECKOUT";
        /// WebDAV versioning `MERGE`.
        pub const MERGE: Merge = "MERGE";
        /// UPnP `M-SEARCH`.
        pub const MSEARCH: MSearch = "M-SEARCH";
        /// UPnP `NOTIFY`.
        pub const NOTIFY: Notify = "NOTIFY";
        /// UPnP `SUBSCRIBE`.
        pub const SUBSCRIBE: Subscribe = "SUBSCRIBE";
        /// UPnP `UNSUBSCRIBE`.
        pub const UNSUBSCRIBE: Unsubscribe = "UNSUBSCRIBE";
        /// The `PATCH` method applies partial modifications to a resource.
        pub const PATCH: Patch = "PATCH";
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== Macros =====

macro_rules! forward {
    ($($(#[$doc:meta])* pub const $name:ident: $variant:ident = $val:literal;)*) => {
        $(
            $(#[$doc])*
            pub const $name: Method = Method(Inner::$variant);
        )*

        /// Create [`Method`] from its canonical uppercase name.
        #[inline]
        pub fn from_bytes(src: &[u8]) -> Option<Method> {
            match src {
                $(
                    _ if src == $val.as_bytes() => Some(Self::$name),
                )*
                _ => None,
            }
        }

        /// Canonical uppercase name, e.g. `"M-SEARCH"`.
        #[inline]
        pub const fn as_str(&self) -> &'static str {
            match self.0 {
                $(
                    Inner::$variant => $val,
                )*
            }
        }
    };
}

use forward;
