use hapcfg_parser::{BindOption, BindRecord};
use hapcfg_types::Bind;
use tracing::debug;

/// Codec for `bind` directives.
pub struct BindCodec;

impl BindCodec {
    /// Decode an on-disk record. Returns `None` when the record's endpoint
    /// splits into no segment at all; such records are skipped.
    pub fn decode(record: &BindRecord) -> Option<Bind> {
        let mut bind = Bind {
            name: record.path.clone(),
            ..Default::default()
        };

        if record.path.starts_with('/') {
            bind.address = Some(record.path.clone());
        } else {
            let Some((address, port)) = split_endpoint(&record.path) else {
                debug!(path = %record.path, "dropping bind record without endpoint segments");
                return None;
            };
            bind.address = Some(address.to_string()).filter(|a| !a.is_empty());
            bind.port = port.filter(|p| !p.is_empty()).and_then(|p| p.parse().ok());
        }

        for option in &record.options {
            match option {
                BindOption::Word(word) => match word.as_str() {
                    "ssl" => bind.ssl = true,
                    "transparent" => bind.transparent = true,
                    _ => {}
                },
                BindOption::Value { name, value } => match name.as_str() {
                    "name" => bind.name = value.clone(),
                    "process" => bind.process = Some(value.clone()),
                    "crt" => bind.ssl_certificate = Some(value.clone()),
                    "ca-file" => bind.ssl_cafile = Some(value.clone()),
                    "tcp-ut" => {
                        bind.tcp_user_timeout = value.parse().ok().filter(|t: &u64| *t != 0);
                    }
                    _ => {}
                },
            }
        }

        Some(bind)
    }

    /// Encode a bind as an on-disk record.
    ///
    /// A `name` option is always emitted; a bind without a name is named
    /// after its endpoint.
    pub fn encode(bind: &Bind) -> BindRecord {
        let path = bind.endpoint();
        let name = if bind.name.is_empty() {
            path.clone()
        } else {
            bind.name.clone()
        };

        let mut options = vec![BindOption::value("name", name)];
        if let Some(process) = &bind.process {
            options.push(BindOption::value("process", process));
        }
        if let Some(crt) = &bind.ssl_certificate {
            options.push(BindOption::value("crt", crt));
        }
        if let Some(ca) = &bind.ssl_cafile {
            options.push(BindOption::value("ca-file", ca));
        }
        if let Some(timeout) = bind.tcp_user_timeout.filter(|t| *t != 0) {
            options.push(BindOption::value("tcp-ut", timeout.to_string()));
        }
        if bind.ssl {
            options.push(BindOption::word("ssl"));
        }
        if bind.transparent {
            options.push(BindOption::word("transparent"));
        }

        BindRecord { path, options }
    }
}

/// Split `address[:port]` into colon-separated segments. The address is the
/// first segment and the port the second; any further segments are ignored.
///
/// The empty endpoint has no segment and yields `None`.
fn split_endpoint(path: &str) -> Option<(&str, Option<&str>)> {
    if path.is_empty() {
        return None;
    }
    let mut segments = path.split(':');
    let address = segments.next()?;
    Some((address, segments.next()))
}
