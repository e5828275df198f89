//! Parameter state for shaderlab: control definitions, the store that
//! projects raw values onto the renderer's uniform snapshot, persistence,
//! skins, presets, and query-string sharing.

mod debounce;
mod error;
mod params;
mod persist;
mod presets;
mod query;
mod skins;
mod store;

use tracing::info;

pub use debounce::{Debouncer, DEFAULT_PERSIST_DEBOUNCE};
pub use error::{Result, StateError};
pub use params::{ParamKind, ParamValue, ParameterDef, ParameterSet, MASTER_KEY};
pub use persist::StoredState;
pub use presets::{builtin_presets, Preset, PresetCatalog, ThemePair, THEMES};
pub use query::{decode as decode_query, encode as encode_query};
pub use skins::{export_current, Skin, SkinBook};
pub use store::ParameterStore;

/// Layers initial values onto a freshly built store: defaults, then stored
/// values, then a preset, then a shared query string. Returns how many
/// values were applied.
pub fn restore(
    store: &mut ParameterStore,
    stored: &StoredState,
    preset: Option<&Preset>,
    query: Option<&str>,
) -> usize {
    let mut applied = 0;
    if let Some(values) = stored.values_for(store.variant()) {
        applied += store.apply(values);
    }
    if let Some(preset) = preset.filter(|p| p.variant == store.variant()) {
        applied += store.apply(&preset.values);
    }
    if let Some(query) = query {
        let decoded = decode_query(&store.parameter_set(), query);
        applied += store.apply(&decoded);
    }
    store.take_changed();
    info!(variant = %store.variant(), applied, "restored parameter state");
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::testing::FakeHost;
    use renderer::{
        Engine, EngineOptions, FrameOutcome, ShaderSources, ShaderVariant, SteppedTimeSource,
    };

    #[test]
    fn query_overrides_preset_which_overrides_stored_values() {
        let mut stored = StoredState::default();
        stored.record_values(
            ShaderVariant::Basic,
            [
                ("hue".to_string(), ParamValue::Scalar(0.1)),
                ("speed".to_string(), ParamValue::Scalar(2.0)),
            ]
            .into(),
        );
        let preset = Preset::new(
            "bright",
            ShaderVariant::Basic,
            [
                ("hue".to_string(), ParamValue::Scalar(0.3)),
                ("intensity".to_string(), ParamValue::Scalar(2.0)),
            ]
            .into(),
        );
        let mut store = ParameterStore::new(ShaderVariant::Basic).unwrap();
        assert_eq!(restore(&mut store, &stored, Some(&preset), Some("h=0.9")), 5);
        assert_eq!(store.get("hue"), Some(ParamValue::Scalar(0.9)));
        assert_eq!(store.get("speed"), Some(ParamValue::Scalar(2.0)));
        assert_eq!(store.get("intensity"), Some(ParamValue::Scalar(2.0)));
        assert_eq!(store.get("master"), Some(ParamValue::Scalar(1.0)));
        assert!(!store.take_changed());
    }

    #[test]
    fn store_writes_reach_the_next_engine_frame() {
        let mut store = ParameterStore::new(ShaderVariant::Lab).unwrap();
        let host = FakeHost::new(store.contract());
        let options = EngineOptions::new(store.contract().clone())
            .with_time_source(Box::new(SteppedTimeSource::per_frame_60hz()));
        let mut engine = Engine::create(
            host.surface(),
            store.snapshot().clone(),
            &ShaderSources::fullscreen("void main() {}"),
            options,
            host.hooks(),
        )
        .unwrap();

        store.set_parameter("emblemHue", 0.75).unwrap();
        store.set_parameter("master", 0.5).unwrap();
        let token = engine.pending_frame().unwrap();
        assert_eq!(engine.on_frame(token).unwrap(), FrameOutcome::Presented);

        let journal = host.journal();
        let frame = journal.frames.last().unwrap();
        assert_eq!(frame.float("uEmblemHue"), Some(0.75));
        assert_eq!(frame.float("uEmblemGloss"), Some(0.25));
        assert_eq!(frame.float("uMaster"), Some(0.5));
    }
}
