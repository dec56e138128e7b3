use hapcfg_cache::{Cache, Keyed, ObjectCache};
use hapcfg_codec::BindCodec;
use hapcfg_parser::{BindRecord, Directive, SectionKind};
use hapcfg_types::{Bind, ValidationError};

/// A kind of configuration object managed through the client.
///
/// Ties the model type to its on-disk record, the section kind that holds
/// it, its codec, and its cache. The accessor and client operations are
/// written once against this trait.
pub trait ConfigObject: Clone + Keyed + Send + Sync + Sized + 'static {
    type Record: Directive;

    /// Human name used in messages, e.g. `bind`.
    const LABEL: &'static str;

    /// Kind of section these objects live in.
    const PARENT: SectionKind;

    fn decode(record: &Self::Record) -> Option<Self>;

    fn encode(&self) -> Self::Record;

    fn validate(&self) -> Result<(), ValidationError>;

    fn cache(cache: &Cache) -> &ObjectCache<Self>;

    /// The object as a read from disk would return it after writing it.
    fn stored(&self) -> Self {
        Self::decode(&self.encode()).unwrap_or_else(|| self.clone())
    }
}

impl ConfigObject for Bind {
    type Record = BindRecord;

    const LABEL: &'static str = "bind";
    const PARENT: SectionKind = SectionKind::Frontend;

    fn decode(record: &BindRecord) -> Option<Self> {
        BindCodec::decode(record)
    }

    fn encode(&self) -> BindRecord {
        BindCodec::encode(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Bind::validate(self)
    }

    fn cache(cache: &Cache) -> &ObjectCache<Self> {
        cache.binds()
    }
}
