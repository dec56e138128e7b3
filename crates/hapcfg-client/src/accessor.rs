//! Section-level access to the objects of one kind.
//!
//! Positions are raw record indexes as the engine counts them. A record the
//! codec drops still occupies its index, so a position returned by
//! [`find_by_name`] always addresses the record that matched.

use hapcfg_parser::{ConfigEngine, ParserError};

use crate::error::{ConfError, ConfResult};
use crate::object::ConfigObject;

/// Decoded objects of a section with their raw record index.
fn list_indexed<K, E>(engine: &E, section: &str) -> ConfResult<Vec<(usize, K)>>
where
    K: ConfigObject,
    E: ConfigEngine,
{
    let records = match engine.get::<K::Record>(K::PARENT, section) {
        Ok(records) => records,
        Err(ParserError::SectionMissing { .. } | ParserError::FetchError { .. }) => {
            return Ok(Vec::new())
        }
        Err(e) => return Err(e.into()),
    };
    Ok(records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| K::decode(record).map(|object| (index, object)))
        .collect())
}

/// All objects in a section, in file order. A missing section is empty.
pub fn list<K, E>(engine: &E, section: &str) -> ConfResult<Vec<K>>
where
    K: ConfigObject,
    E: ConfigEngine,
{
    Ok(list_indexed(engine, section)?
        .into_iter()
        .map(|(_, object)| object)
        .collect())
}

/// The first object named `name` and its position.
pub fn find_by_name<K, E>(engine: &E, name: &str, section: &str) -> ConfResult<Option<(K, usize)>>
where
    K: ConfigObject,
    E: ConfigEngine,
{
    Ok(list_indexed::<K, E>(engine, section)?
        .into_iter()
        .find(|(_, object)| object.key() == name)
        .map(|(index, object)| (object, index)))
}

/// Insert an object before position `index`, or append it.
pub fn insert<K, E>(engine: &mut E, section: &str, object: &K, index: Option<usize>) -> ConfResult<()>
where
    K: ConfigObject,
    E: ConfigEngine,
{
    engine
        .insert(K::PARENT, section, &object.encode(), index)
        .map_err(|e| classify::<K>(e, section, object.key()))
}

/// Replace the object at `index`.
pub fn set_at<K, E>(engine: &mut E, section: &str, object: &K, index: usize) -> ConfResult<()>
where
    K: ConfigObject,
    E: ConfigEngine,
{
    engine
        .set(K::PARENT, section, &object.encode(), index)
        .map_err(|e| classify::<K>(e, section, object.key()))
}

/// Remove the object `name` found at `index`.
pub fn delete_at<K, E>(engine: &mut E, section: &str, name: &str, index: usize) -> ConfResult<()>
where
    K: ConfigObject,
    E: ConfigEngine,
{
    engine
        .delete::<K::Record>(K::PARENT, section, index)
        .map_err(|e| classify::<K>(e, section, name))
}

pub(crate) fn section_not_found<K: ConfigObject>(section: &str) -> ConfError {
    ConfError::NotFound(format!(
        "{} {section} does not exist",
        K::PARENT.keyword()
    ))
}

pub(crate) fn object_not_found<K: ConfigObject>(name: &str, section: &str) -> ConfError {
    ConfError::NotFound(format!(
        "{} {name} does not exist in {} {section}",
        K::LABEL,
        K::PARENT.keyword()
    ))
}

/// Not-found error for `name`, naming the section instead when the section
/// itself is missing.
pub fn not_found<K, E>(engine: &E, name: &str, section: &str) -> ConfError
where
    K: ConfigObject,
    E: ConfigEngine,
{
    if engine
        .section_names(K::PARENT)
        .iter()
        .any(|existing| existing == section)
    {
        object_not_found::<K>(name, section)
    } else {
        section_not_found::<K>(section)
    }
}

/// Map engine faults on a mutation. A stale position means the object is
/// gone; a directive the engine refuses to render fails validation.
fn classify<K: ConfigObject>(err: ParserError, section: &str, name: &str) -> ConfError {
    match err {
        ParserError::SectionMissing { .. } => section_not_found::<K>(section),
        ParserError::FetchError { .. } => object_not_found::<K>(name, section),
        ParserError::InvalidDirective { .. } => ConfError::ValidationFailed(err.to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hapcfg_parser::{BindRecord, SectionKind, TextConfig};
    use hapcfg_types::Bind;

    const CONFIG: &str = "\
frontend web
  bind 0.0.0.0:80 name http
  bind 0.0.0.0:443 name https ssl
  default_backend app

frontend bare
  mode http

backend app
  server s1 10.0.0.1:8080
";

    fn engine() -> TextConfig {
        TextConfig::parse(CONFIG).unwrap()
    }

    #[test]
    fn list_in_file_order() {
        let binds: Vec<Bind> = list(&engine(), "web").unwrap();
        let names: Vec<_> = binds.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["http", "https"]);
        assert!(binds[1].ssl);
    }

    #[test]
    fn missing_section_or_kind_is_empty() {
        assert!(list::<Bind, _>(&engine(), "nope").unwrap().is_empty());
        assert!(list::<Bind, _>(&engine(), "bare").unwrap().is_empty());
    }

    #[test]
    fn find_returns_raw_index() {
        let (bind, index) = find_by_name::<Bind, _>(&engine(), "https", "web")
            .unwrap()
            .unwrap();
        assert_eq!(bind.port, Some(443));
        assert_eq!(index, 1);
        assert!(find_by_name::<Bind, _>(&engine(), "gone", "web").unwrap().is_none());
    }

    #[test]
    fn positions_count_every_record_in_the_section() {
        let mut engine = engine();
        engine
            .insert_line(
                SectionKind::Frontend,
                "web",
                "bind",
                "bind :".to_string(),
                Some(0),
            )
            .unwrap();
        let (_, index) = find_by_name::<Bind, _>(&engine, "https", "web")
            .unwrap()
            .unwrap();
        assert_eq!(index, 2);

        delete_at::<Bind, _>(&mut engine, "web", "https", index).unwrap();
        let records: Vec<BindRecord> = engine.get(SectionKind::Frontend, "web").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].path, "0.0.0.0:80");
    }

    #[test]
    fn mutations_classify_faults() {
        let mut engine = engine();
        let bind = Bind::new("x", "1.1.1.1", Some(1));

        let err = insert(&mut engine, "nope", &bind, None).unwrap_err();
        assert_eq!(err.to_string(), "frontend nope does not exist");

        let err = set_at(&mut engine, "web", &bind, 9).unwrap_err();
        assert_eq!(err.to_string(), "bind x does not exist in frontend web");

        let err = delete_at::<Bind, _>(&mut engine, "bare", "x", 0).unwrap_err();
        assert!(matches!(err, ConfError::NotFound(_)));
    }

    #[test]
    fn malformed_record_on_read_is_an_engine_fault() {
        let engine = TextConfig::parse("frontend web\n  bind :80 name ok\n  bind\n").unwrap();
        let err = list::<Bind, _>(&engine, "web").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Engine);
        assert!(find_by_name::<Bind, _>(&engine, "ok", "web").is_err());
    }

    #[test]
    fn unrenderable_object_fails_validation() {
        let mut engine = engine();
        let mut bind = Bind::new("x", "1.1.1.1", Some(1));
        bind.process = Some("1 2".into());
        let err = insert(&mut engine, "web", &bind, None).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ValidationFailed);
        let err = set_at(&mut engine, "web", &bind, 0).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ValidationFailed);
    }

    #[test]
    fn not_found_names_missing_section() {
        let engine = engine();
        assert_eq!(
            not_found::<Bind, _>(&engine, "x", "web").to_string(),
            "bind x does not exist in frontend web"
        );
        assert_eq!(
            not_found::<Bind, _>(&engine, "x", "nope").to_string(),
            "frontend nope does not exist"
        );
    }

    #[test]
    fn insert_appends_after_last_bind() {
        let mut engine = engine();
        insert(&mut engine, "bare", &Bind::new("n", "/run/n.sock", None), None).unwrap();
        insert(&mut engine, "web", &Bind::new("alt", "0.0.0.0", Some(8080)), None).unwrap();
        let text = engine.render();
        assert!(text.contains(
            "  bind 0.0.0.0:443 name https ssl\n  bind 0.0.0.0:8080 name alt\n  default_backend app"
        ));
        assert!(text.contains("frontend bare\n  mode http\n  bind /run/n.sock name n\n"));
    }
}
