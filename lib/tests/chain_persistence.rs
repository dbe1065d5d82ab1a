mod common;

use common::passengers_view;
use ml_chain::dataset::{materialize, DataView};
use ml_chain::persist::{
    load_model, save_model, ContainerConfig, LoadContext, ModelContainer, ModelHeader,
    SaveContext, TransformRegistry, VersionInfo,
};
use ml_chain::schema::Schema;
use ml_chain::transforms::{Concat, CopyColumns, DropMissing, SelectColumns, StandardScale};
use ml_chain::{ChainError, LoadableTransform, Scope, Transform, TransformerChain};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn scoped_chain() -> TransformerChain {
    TransformerChain::empty()
        .append_scoped(DropMissing::new(["age"]), Scope::TRAINING)
        .append_scoped(CopyColumns::new([("age", "age_raw")]), Scope::TRAIN_TEST)
        .append(StandardScale::new("age", 30.0, 8.0))
        .append_scoped(Concat::new("features", ["age", "fare"]), Scope::SCORING)
        .into_generic()
}

fn rebuild(
    container: &ModelContainer,
    edit: impl Fn(&str, &[u8]) -> Option<Vec<u8>>,
) -> ModelContainer {
    let mut out = ModelContainer::new();
    for name in container.section_names() {
        let bytes = container.open_section(name).unwrap();
        if let Some(bytes) = edit(name, bytes) {
            out.write_section(name, bytes).unwrap();
        }
    }
    out
}

#[test]
fn test_round_trip_preserves_stages_and_behaviour() {
    let chain = scoped_chain();
    let mut container = ModelContainer::new();
    chain.save(&mut container).unwrap();

    let registry = TransformRegistry::with_builtins();
    let loaded = TransformerChain::load(&container, &registry).unwrap();

    assert_eq!(loaded.len(), chain.len());
    assert_eq!(loaded.scopes(), chain.scopes());
    let names: Vec<_> = loaded.transforms().iter().map(|t| t.name()).collect();
    assert_eq!(
        names,
        vec!["DropMissing", "CopyColumns", "StandardScale", "Concat"]
    );

    let input = passengers_view();
    assert_eq!(
        loaded.output_schema(input.schema()).unwrap(),
        chain.output_schema(input.schema()).unwrap()
    );
    let before = materialize(chain.transform(input.clone()).unwrap().as_ref()).unwrap();
    let after = materialize(loaded.transform(input).unwrap().as_ref()).unwrap();
    assert_eq!(before.into_rows(), after.into_rows());
}

#[test]
fn test_three_stage_section_layout() {
    let chain = TransformerChain::empty()
        .append_scoped(CopyColumns::new([("age", "a")]), Scope::TRAINING)
        .append_scoped(SelectColumns::new(["a"]), Scope::TESTING | Scope::SCORING)
        .append(StandardScale::new("a", 0.0, 2.0));
    let mut container = ModelContainer::new();
    chain.save(&mut container).unwrap();

    assert_eq!(
        container.section_names(),
        vec![
            "Model",
            "Model/Transform_000",
            "Model/Transform_001",
            "Model/Transform_002"
        ]
    );

    let mut payload = container.open_section("Model").unwrap();
    let header: ModelHeader = bincode::deserialize_from(&mut payload).unwrap();
    assert_eq!(header.signature, "TRANCHAI");
    assert_eq!(header.loader_key, "TransformerChain");
    let count: u32 = bincode::deserialize_from(&mut payload).unwrap();
    assert_eq!(count, 3);
    let scopes: Vec<u32> = (0..3)
        .map(|_| bincode::deserialize_from(&mut payload).unwrap())
        .collect();
    assert_eq!(scopes, vec![1, 6, 7]);
    assert!(payload.is_empty());

    let loaded =
        TransformerChain::load(&container, &TransformRegistry::with_builtins()).unwrap();
    assert_eq!(
        loaded.scopes(),
        &[Scope::TRAINING, Scope::TESTING | Scope::SCORING, Scope::EVERYTHING]
    );
    assert_eq!(loaded.last_transform().unwrap().name(), "StandardScale");
}

#[test]
fn test_empty_chain_round_trip() {
    let mut container = ModelContainer::new();
    TransformerChain::empty().save(&mut container).unwrap();
    assert_eq!(container.section_names(), vec!["Model"]);
    let loaded = TransformerChain::load(&container, &TransformRegistry::new()).unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn test_nested_chain_round_trip() {
    let inner = TransformerChain::empty()
        .append(CopyColumns::new([("age", "a2")]))
        .append(SelectColumns::new(["a2"]));
    let outer = TransformerChain::empty().append_scoped(inner, Scope::SCORING);
    let mut container = ModelContainer::new();
    outer.save(&mut container).unwrap();
    assert!(container.contains("Model/Transform_000/Transform_001"));

    let loaded = TransformerChain::load(&container, &TransformRegistry::with_builtins()).unwrap();
    assert_eq!(loaded.scopes(), &[Scope::SCORING]);
    let schema = loaded.output_schema(passengers_view().schema()).unwrap();
    assert_eq!(schema.names(), vec!["a2"]);
}

#[test]
fn test_loading_non_chain_as_chain() {
    let mut container = ModelContainer::new();
    save_model(&mut container, "Model", &SelectColumns::new(["age"])).unwrap();
    match TransformerChain::load(&container, &TransformRegistry::with_builtins()) {
        Err(ChainError::WrongEntityKind { expected, found }) => {
            assert_eq!(expected, "TRANCHAI");
            assert_eq!(found, "SELECTCO");
        }
        other => panic!("expected wrong entity kind, got {other:?}"),
    }

    // Loading it generically works.
    let model = load_model(&container, &TransformRegistry::with_builtins(), "Model").unwrap();
    assert_eq!(model.name(), "SelectColumns");
}

#[test]
fn test_unregistered_transform() {
    let mut container = ModelContainer::new();
    scoped_chain().save(&mut container).unwrap();
    match TransformerChain::load(&container, &TransformRegistry::new()) {
        Err(ChainError::UnknownFormat(key)) => assert_eq!(key, "DropMissing"),
        other => panic!("expected unknown format, got {other:?}"),
    }
}

#[test]
fn test_truncated_section() {
    let mut container = ModelContainer::new();
    scoped_chain().save(&mut container).unwrap();
    let truncated = rebuild(&container, |name, bytes| {
        Some(if name == "Model/Transform_001" {
            bytes[..bytes.len() - 1].to_vec()
        } else {
            bytes.to_vec()
        })
    });
    let err =
        TransformerChain::load(&truncated, &TransformRegistry::with_builtins()).unwrap_err();
    assert!(matches!(err, ChainError::UnexpectedEndOfStream(_)), "{err:?}");
}

#[test]
fn test_trailing_bytes_in_section() {
    let mut container = ModelContainer::new();
    scoped_chain().save(&mut container).unwrap();
    let padded = rebuild(&container, |name, bytes| {
        let mut bytes = bytes.to_vec();
        if name == "Model/Transform_002" {
            bytes.push(0);
        }
        Some(bytes)
    });
    match TransformerChain::load(&padded, &TransformRegistry::with_builtins()) {
        Err(ChainError::Framing { section, remaining }) => {
            assert_eq!(section, "Model/Transform_002");
            assert_eq!(remaining, 1);
        }
        other => panic!("expected framing error, got {other:?}"),
    }
}

#[test]
fn test_missing_nested_section() {
    let mut container = ModelContainer::new();
    scoped_chain().save(&mut container).unwrap();
    let gutted = rebuild(&container, |name, bytes| {
        (name != "Model/Transform_001").then(|| bytes.to_vec())
    });
    match TransformerChain::load(&gutted, &TransformRegistry::with_builtins()) {
        Err(ChainError::MissingSection(name)) => assert_eq!(name, "Model/Transform_001"),
        other => panic!("expected missing section, got {other:?}"),
    }
}

#[test]
fn test_invalid_scope_bits() {
    let mut container = ModelContainer::new();
    TransformerChain::empty()
        .append(SelectColumns::new(["age"]))
        .save(&mut container)
        .unwrap();
    let corrupted = rebuild(&container, |name, bytes| {
        if name != "Model" {
            return Some(bytes.to_vec());
        }
        let mut reader = bytes;
        let header: ModelHeader = bincode::deserialize_from(&mut reader).unwrap();
        let mut out = bincode::serialize(&header).unwrap();
        out.extend(bincode::serialize(&1u32).unwrap());
        out.extend(bincode::serialize(&0u32).unwrap());
        Some(out)
    });
    let err =
        TransformerChain::load(&corrupted, &TransformRegistry::with_builtins()).unwrap_err();
    assert!(matches!(err, ChainError::Serialization(_)), "{err:?}");
}

#[test]
fn test_saving_twice_into_one_container() {
    let mut container = ModelContainer::new();
    let chain = scoped_chain();
    chain.save(&mut container).unwrap();
    assert!(matches!(
        chain.save(&mut container),
        Err(ChainError::DuplicateSection(name)) if name == "Model"
    ));
    // A different root name is fine.
    chain.save_named(&mut container, "Other").unwrap();
    assert!(container.contains("Other/Transform_003"));
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.bin");
    let config = ContainerConfig::new().with_model_name("Pipeline");

    let chain = scoped_chain();
    chain.save_to_file(&path, &config).unwrap();

    let registry = TransformRegistry::with_builtins();
    let loaded = TransformerChain::load_from_file(&path, &registry, &config).unwrap();
    assert_eq!(loaded.scopes(), chain.scopes());

    match TransformerChain::load_from_file(&path, &registry, &ContainerConfig::default()) {
        Err(ChainError::MissingSection(name)) => assert_eq!(name, "Model"),
        other => panic!("expected missing section, got {other:?}"),
    }

    let tiny = config.with_max_file_bytes(8);
    assert!(matches!(
        TransformerChain::load_from_file(&path, &registry, &tiny),
        Err(ChainError::Io(_))
    ));
}

#[test]
fn test_not_a_container_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.bin");
    std::fs::write(&path, b"definitely not a model").unwrap();
    let err = ModelContainer::load_from_file(&path, &ContainerConfig::default()).unwrap_err();
    assert!(matches!(err, ChainError::Serialization(_)), "{err:?}");
}

static PROBE_LOADS: AtomicUsize = AtomicUsize::new(0);

/// Records how often its loader runs.
#[derive(Debug)]
struct Probe;

impl Transform for Probe {
    fn version_info(&self) -> VersionInfo {
        Self::VERSION
    }

    fn output_schema(&self, input: &Schema) -> ml_chain::Result<Schema> {
        Ok(input.clone())
    }

    fn is_row_to_row_mapper(&self) -> bool {
        false
    }

    fn apply(&self, input: Arc<dyn DataView>) -> ml_chain::Result<Arc<dyn DataView>> {
        Ok(input)
    }

    fn save(&self, _ctx: &mut SaveContext<'_>) -> ml_chain::Result<()> {
        Ok(())
    }
}

impl LoadableTransform for Probe {
    const VERSION: VersionInfo =
        VersionInfo::new("PROBEXFM", 0x0002_0001, 0x0002_0000, 0x0001_0005, "Probe");

    fn load(_ctx: &mut LoadContext<'_>) -> ml_chain::Result<Self> {
        PROBE_LOADS.fetch_add(1, Ordering::SeqCst);
        Ok(Probe)
    }
}

fn probe_section(written: u32, readable: u32) -> Vec<u8> {
    let header = VersionInfo::new("PROBEXFM", written, readable, readable, "Probe").header();
    bincode::serialize(&header).unwrap()
}

#[test]
fn test_version_gate_runs_before_loader() {
    let registry = TransformRegistry::with_builtins()
        .register::<Probe>()
        .unwrap();

    // Written by a newer build that older readers cannot decode.
    let mut container = ModelContainer::new();
    container
        .write_section("Model", probe_section(0x0003_0001, 0x0003_0000))
        .unwrap();
    match load_model(&container, &registry, "Model") {
        Err(ChainError::UnsupportedFormatVersion {
            signature, found, ..
        }) => {
            assert_eq!(signature, "PROBEXFM");
            assert_eq!(found, 0x0003_0000);
        }
        other => panic!("expected unsupported version, got {other:?}"),
    }

    // Older than anything this build still reads.
    let mut container = ModelContainer::new();
    container
        .write_section("Model", probe_section(0x0001_0004, 0x0001_0004))
        .unwrap();
    assert!(matches!(
        load_model(&container, &registry, "Model"),
        Err(ChainError::UnsupportedFormatVersion { .. })
    ));

    // Inside a chain the gate fires for the nested entity too.
    let mut container = ModelContainer::new();
    TransformerChain::empty()
        .append(Probe)
        .save(&mut container)
        .unwrap();
    let newer = rebuild(&container, |name, bytes| {
        Some(if name == "Model/Transform_000" {
            probe_section(0x0009_0000, 0x0009_0000)
        } else {
            bytes.to_vec()
        })
    });
    assert!(matches!(
        TransformerChain::load(&newer, &registry),
        Err(ChainError::UnsupportedFormatVersion { .. })
    ));

    assert_eq!(PROBE_LOADS.load(Ordering::SeqCst), 0);

    // A compatible older writer passes and the loader runs once.
    let mut container = ModelContainer::new();
    container
        .write_section("Model", probe_section(0x0001_0005, 0x0001_0005))
        .unwrap();
    load_model(&container, &registry, "Model").unwrap();
    assert_eq!(PROBE_LOADS.load(Ordering::SeqCst), 1);
}
