//! Constructor registry and stream reconstruction.
//!
//! - FxHashMap lookups keyed by class name or chunk tag
//! - One process-wide instance, installed once and read-only afterwards

use std::hash::BuildHasherDefault;
use std::sync::OnceLock;

use darkstar_common::{ChunkHeader, Ident, MemStream};
use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;

use crate::{Error, PersistObject, Result};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Constructor producing a fresh, unread object.
pub type Factory = fn() -> Box<dyn PersistObject>;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Mapping from class name and chunk tag to object constructors.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    by_name: FxHashMap<String, Factory>,
    by_tag: FxHashMap<Ident, Factory>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for `PERS` chunks naming `name`.
    ///
    /// Registering the same name again replaces the earlier constructor.
    pub fn register_name(&mut self, name: impl Into<String>, factory: Factory) -> &mut Self {
        let name = name.into();
        if self.by_name.insert(name.clone(), factory).is_some() {
            log::debug!("replaced persisted class {name:?}");
        }
        self
    }

    /// Register a constructor for chunks whose identifier is `tag`.
    ///
    /// Registering the same tag again replaces the earlier constructor.
    pub fn register_tag(&mut self, tag: Ident, factory: Factory) -> &mut Self {
        if self.by_tag.insert(tag, factory).is_some() {
            log::debug!("replaced persisted tag {tag}");
        }
        self
    }

    /// Construct an unread object by class name.
    pub fn create_by_name(&self, name: &str) -> Option<Box<dyn PersistObject>> {
        self.by_name.get(name).map(|factory| factory())
    }

    /// Construct an unread object by chunk tag.
    pub fn create_by_tag(&self, tag: Ident) -> Option<Box<dyn PersistObject>> {
        self.by_tag.get(&tag).map(|factory| factory())
    }

    /// Number of registered names and tags.
    pub fn len(&self) -> usize {
        self.by_name.len() + self.by_tag.len()
    }

    /// Check whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuild the object stored in the chunk at the stream position.
    ///
    /// On return the stream sits at the end of the chunk, or further if the
    /// object read past it. A failed object is dropped and never returned.
    pub fn create_from_stream(&self, stream: &mut MemStream<&[u8]>) -> Result<Box<dyn PersistObject>> {
        let header = ChunkHeader::read(stream)?;
        let start = stream.position();
        let end = start.saturating_add(header.aligned_size() as usize);

        let result = self.construct(header, stream);

        if stream.position() < end {
            stream.set_position(end.min(stream.len()));
        }
        result
    }

    fn construct(&self, header: ChunkHeader, stream: &mut MemStream<&[u8]>) -> Result<Box<dyn PersistObject>> {
        let (mut object, version) = if header.ident == Ident::PERS {
            let name = stream.read_sstring()?;
            let version = stream.read_u32()?;
            let object = self.create_by_name(&name).ok_or(Error::UnknownClass(name))?;
            (object, version)
        } else {
            let object = self
                .create_by_tag(header.ident)
                .ok_or(darkstar_common::Error::UnknownFormat(header.ident))?;
            (object, 0)
        };

        log::trace!(
            "reading {} v{} ({} bytes)",
            object.class_name(),
            version,
            header.aligned_size()
        );
        object.read(stream, version)?;
        Ok(object)
    }

    /// Make this registry the process-wide instance.
    ///
    /// Only the first install succeeds; all registration must happen before.
    pub fn install(self) -> Result<&'static Registry> {
        let mut candidate = Some(self);
        let installed = GLOBAL.get_or_init(|| candidate.take().unwrap_or_default());
        match candidate {
            None => Ok(installed),
            Some(_) => Err(Error::AlreadyInstalled),
        }
    }
}

/// The process-wide registry, if one has been installed.
pub fn global() -> Option<&'static Registry> {
    GLOBAL.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        version: u32,
        values: Vec<u32>,
    }

    impl PersistObject for Counter {
        fn class_name(&self) -> &'static str {
            "Test::Counter"
        }

        fn read(&mut self, stream: &mut MemStream<&[u8]>, version: u32) -> Result<()> {
            self.version = version;
            let count = stream.read_u32()?;
            for _ in 0..count {
                self.values.push(stream.read_u32()?);
            }
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Other;

    impl PersistObject for Other {
        fn class_name(&self) -> &'static str {
            "Test::Other"
        }

        fn read(&mut self, _stream: &mut MemStream<&[u8]>, _version: u32) -> Result<()> {
            Ok(())
        }
    }

    fn counter() -> Box<dyn PersistObject> {
        Box::<Counter>::default()
    }

    fn other() -> Box<dyn PersistObject> {
        Box::new(Other)
    }

    const TAG: Ident = Ident(*b"CNTR");

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register_name("Test::Counter", counter)
            .register_tag(TAG, counter);
        registry
    }

    fn pers_chunk(name: &str, version: u32, payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&(name.len() as u16).to_le_bytes());
        body.extend_from_slice(name.as_bytes());
        if name.len() % 2 == 1 {
            body.push(0);
        }
        body.extend_from_slice(&version.to_le_bytes());
        body.extend_from_slice(payload);

        let mut data = Vec::new();
        data.extend_from_slice(b"PERS");
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        data.extend_from_slice(&body);
        if body.len() % 2 == 1 {
            data.push(0);
        }
        data
    }

    #[test]
    fn test_create_by_tag() {
        let registry = registry();
        let object = registry.create_by_tag(TAG).unwrap();
        assert!(object.is::<Counter>());
        assert!(registry.create_by_tag(Ident(*b"NONE")).is_none());
        assert!(registry.create_by_name("Test::Missing").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = registry();
        registry.register_tag(TAG, other);
        assert!(registry.create_by_tag(TAG).unwrap().is::<Other>());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_create_from_pers_chunk() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&2u32.to_le_bytes());
        payload.extend_from_slice(&10u32.to_le_bytes());
        payload.extend_from_slice(&20u32.to_le_bytes());
        // Trailing bytes the object does not consume.
        payload.extend_from_slice(&[0xAA; 6]);

        let mut data = pers_chunk("Test::Counter", 3, &payload);
        data.extend_from_slice(b"tail");

        let mut stream = MemStream::new(&data[..]);
        let object = registry().create_from_stream(&mut stream).unwrap();
        let counter = object.downcast::<Counter>().unwrap();
        assert_eq!(counter.version, 3);
        assert_eq!(counter.values, [10, 20]);
        assert_eq!(stream.remaining_bytes(), b"tail");
    }

    #[test]
    fn test_create_from_tagged_chunk() {
        let mut data = Vec::new();
        data.extend_from_slice(b"CNTR");
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&7u32.to_le_bytes());

        let mut stream = MemStream::new(&data[..]);
        let object = registry().create_from_stream(&mut stream).unwrap();
        let counter = object.downcast_ref::<Counter>().unwrap();
        assert_eq!(counter.version, 0);
        assert_eq!(counter.values, [7]);
        assert!(stream.is_eof());
    }

    #[test]
    fn test_unknown_class_skips_chunk() {
        let mut data = pers_chunk("Test::Missing", 1, &[1, 2, 3, 4]);
        data.extend_from_slice(b"next");

        let mut stream = MemStream::new(&data[..]);
        let result = registry().create_from_stream(&mut stream);
        assert!(matches!(result, Err(Error::UnknownClass(ref name)) if name == "Test::Missing"));
        assert_eq!(stream.remaining_bytes(), b"next");
    }

    #[test]
    fn test_unknown_tag() {
        let mut data = Vec::new();
        data.extend_from_slice(b"ZZZZ");
        data.extend_from_slice(&0u32.to_le_bytes());

        let mut stream = MemStream::new(&data[..]);
        assert!(matches!(
            registry().create_from_stream(&mut stream),
            Err(Error::Common(darkstar_common::Error::UnknownFormat(ident))) if ident == Ident(*b"ZZZZ")
        ));
    }

    #[test]
    fn test_failed_read_is_discarded() {
        // Claims three values but carries one.
        let mut payload = Vec::new();
        payload.extend_from_slice(&3u32.to_le_bytes());
        payload.extend_from_slice(&1u32.to_le_bytes());
        let data = pers_chunk("Test::Counter", 0, &payload);

        let mut stream = MemStream::new(&data[..]);
        let result = registry().create_from_stream(&mut stream);
        assert!(matches!(
            result,
            Err(Error::Common(darkstar_common::Error::OutOfBounds { .. }))
        ));
        assert!(stream.is_eof());
    }

    #[test]
    fn test_downcast_mismatch_returns_object() {
        let object = registry().create_by_tag(TAG).unwrap();
        let object = object.downcast::<Other>().unwrap_err();
        assert_eq!(object.class_name(), "Test::Counter");
    }

    #[test]
    fn test_install_once() {
        assert!(registry().install().is_ok());
        assert!(matches!(Registry::new().install(), Err(Error::AlreadyInstalled)));
        assert!(global().unwrap().create_by_tag(TAG).is_some());
    }
}
