//! Keyboard "slider panel" for the preview window.
//!
//! Tabs group the parameters of the active variant; one parameter is
//! selected at a time and adjusted by its step. Every change lands in the
//! shared snapshot immediately and is persisted after a quiet period.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use labstate::{
    encode_query, export_current, Debouncer, ParamKind, ParameterDef, ParameterStore,
    PresetCatalog, StoredState, ThemePair,
};
use renderer::window::{Key, ModifiersState, NamedKey};
use renderer::{KeyResponse, PreviewController, ShaderVariant};
use tracing::{info, warn};

const COARSE_STEPS: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    NextTab,
    PreviousTab,
    SelectNext,
    SelectPrevious,
    Adjust(f32),
    SaveSkin,
    NextSkin,
    NextPreset,
    NextTheme,
    Reset,
    ExportJson,
    ShareLink,
    Quit,
}

impl Action {
    pub fn from_key(key: &Key, modifiers: ModifiersState) -> Option<Self> {
        let shift = modifiers.shift_key();
        let steps = if shift { COARSE_STEPS } else { 1.0 };
        match key {
            Key::Named(NamedKey::Tab) if shift => Some(Action::PreviousTab),
            Key::Named(NamedKey::Tab) => Some(Action::NextTab),
            Key::Named(NamedKey::ArrowDown) => Some(Action::SelectNext),
            Key::Named(NamedKey::ArrowUp) => Some(Action::SelectPrevious),
            Key::Named(NamedKey::ArrowRight) => Some(Action::Adjust(steps)),
            Key::Named(NamedKey::ArrowLeft) => Some(Action::Adjust(-steps)),
            Key::Named(NamedKey::Escape) => Some(Action::Quit),
            Key::Character(text) => match text.to_ascii_lowercase().as_str() {
                "s" => Some(Action::SaveSkin),
                "k" => Some(Action::NextSkin),
                "p" => Some(Action::NextPreset),
                "t" => Some(Action::NextTheme),
                "r" => Some(Action::Reset),
                "e" => Some(Action::ExportJson),
                "l" => Some(Action::ShareLink),
                _ => None,
            },
            _ => None,
        }
    }
}

pub struct LabControls {
    store: ParameterStore,
    presets: PresetCatalog,
    state: StoredState,
    state_path: Option<PathBuf>,
    debounce: Debouncer,
    tabs: Vec<&'static str>,
    tab: usize,
    selected: usize,
    preset: Option<String>,
    skin: Option<String>,
    message: Option<String>,
}

impl LabControls {
    /// `state_path` is `None` when persistence is disabled.
    pub fn new(
        store: ParameterStore,
        presets: PresetCatalog,
        state: StoredState,
        state_path: Option<PathBuf>,
        debounce: Duration,
    ) -> Self {
        let tabs = store.parameter_set().tabs();
        Self {
            store,
            presets,
            state,
            state_path,
            debounce: Debouncer::new(debounce),
            tabs,
            tab: 0,
            selected: 0,
            preset: None,
            skin: None,
            message: None,
        }
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn current_tab(&self) -> &'static str {
        self.tabs.get(self.tab).copied().unwrap_or("")
    }

    pub fn selected(&self) -> Option<&'static ParameterDef> {
        let tab = self.current_tab();
        self.store.parameter_set().in_tab(tab).nth(self.selected)
    }

    pub fn apply(&mut self, action: Action, now: Instant) -> KeyResponse {
        self.message = None;
        match action {
            Action::NextTab => self.switch_tab(1),
            Action::PreviousTab => self.switch_tab(self.tabs.len().saturating_sub(1)),
            Action::SelectNext => self.move_selection(true),
            Action::SelectPrevious => self.move_selection(false),
            Action::Adjust(steps) => self.adjust(steps),
            Action::SaveSkin => self.save_skin(),
            Action::NextSkin => self.next_skin(),
            Action::NextPreset => self.next_preset(),
            Action::NextTheme => self.next_theme(),
            Action::Reset => {
                if let Err(err) = self.store.reset() {
                    warn!("failed to reset parameters: {err}");
                }
                self.preset = None;
                self.message = Some("reset".to_string());
            }
            Action::ExportJson => match self.export_json() {
                Ok(json) => println!("{json}"),
                Err(err) => warn!("failed to export state: {err}"),
            },
            Action::ShareLink => println!("{}", self.share_query()),
            Action::Quit => return KeyResponse::Exit,
        }
        if self.store.take_changed() {
            self.debounce.touch(now);
        }
        KeyResponse::Handled
    }

    pub fn export_json(&self) -> labstate::Result<String> {
        export_current(self.store.variant(), &self.store.values())
    }

    pub fn share_query(&self) -> String {
        encode_query(&self.store.parameter_set(), &self.store.values())
    }

    fn switch_tab(&mut self, offset: usize) {
        if !self.tabs.is_empty() {
            self.tab = (self.tab + offset) % self.tabs.len();
            self.selected = 0;
        }
    }

    fn move_selection(&mut self, forward: bool) {
        let count = self.store.parameter_set().in_tab(self.current_tab()).count();
        if count == 0 {
            return;
        }
        self.selected = if forward {
            (self.selected + 1) % count
        } else {
            (self.selected + count - 1) % count
        };
    }

    fn adjust(&mut self, steps: f32) {
        let Some(def) = self.selected() else {
            return;
        };
        match def.kind {
            ParamKind::Scalar { .. } => {
                if let Err(err) = self.store.nudge(def.key, steps) {
                    warn!(parameter = def.key, "failed to adjust parameter: {err}");
                }
            }
            ParamKind::Color { .. } => self.next_theme(),
        }
    }

    fn next_theme(&mut self) {
        if self.store.variant() != ShaderVariant::Lab {
            return;
        }
        let current = match self.store.get("themeA") {
            Some(labstate::ParamValue::Color(rgb)) => Some(rgb),
            _ => None,
        };
        let theme = ThemePair::next(current);
        self.store.apply(&theme.values());
        self.message = Some(format!("theme {}", theme.name));
    }

    fn next_preset(&mut self) {
        let Some(name) = self
            .presets
            .next_after(self.store.variant(), self.preset.as_deref())
            .map(|preset| preset.name.clone())
        else {
            self.message = Some("no presets".to_string());
            return;
        };
        match self.presets.apply(&mut self.store, &name) {
            Ok(_) => {
                self.message = Some(format!("preset {name}"));
                self.preset = Some(name);
            }
            Err(err) => warn!("failed to apply preset: {err}"),
        }
    }

    fn next_skin(&mut self) {
        let Some(skin) = self
            .state
            .skins
            .next_after(self.store.variant(), self.skin.as_deref())
        else {
            self.message = Some("no skins".to_string());
            return;
        };
        let applied = self.store.apply(&skin.values);
        info!(skin = %skin.name, applied, "loaded skin");
        self.message = Some(format!("skin {}", skin.name));
        self.skin = Some(skin.name.clone());
    }

    fn save_skin(&mut self) {
        let skin = self
            .state
            .skins
            .save(None, self.store.variant(), self.store.values(), Utc::now());
        self.message = Some(format!("saved {}", skin.name));
        self.skin = Some(skin.name.clone());
        self.persist();
    }

    fn persist(&mut self) {
        self.debounce.cancel();
        let Some(path) = &self.state_path else {
            return;
        };
        self.state
            .record_values(self.store.variant(), self.store.values());
        match self.state.persist(path) {
            Ok(()) => info!(path = %path.display(), "saved parameter state"),
            Err(err) => warn!("failed to save parameter state: {err}"),
        }
    }
}

impl PreviewController for LabControls {
    fn on_key(&mut self, key: &Key, modifiers: ModifiersState) -> KeyResponse {
        match Action::from_key(key, modifiers) {
            Some(action) => self.apply(action, Instant::now()),
            None => KeyResponse::Ignored,
        }
    }

    fn on_idle(&mut self, now: Instant) -> Option<Instant> {
        if self.debounce.due(now) {
            self.persist();
        }
        self.debounce.deadline()
    }

    fn on_exit(&mut self) {
        if self.debounce.is_pending() {
            self.persist();
        }
    }

    fn status_line(&self) -> String {
        let mut line = format!("{} [{}]", self.store.variant(), self.current_tab());
        if let Some(def) = self.selected() {
            if let Some(value) = self.store.get(def.key) {
                line.push_str(&format!(" {}: {value}", def.label));
            }
        }
        if let Some(message) = &self.message {
            line.push_str(&format!(" | {message}"));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labstate::ParamValue;
    use tempfile::TempDir;

    fn controls(variant: ShaderVariant, state_path: Option<PathBuf>) -> LabControls {
        LabControls::new(
            ParameterStore::new(variant).unwrap(),
            PresetCatalog::default(),
            StoredState::default(),
            state_path,
            Duration::from_millis(150),
        )
    }

    #[test]
    fn keys_map_to_actions() {
        let shift = ModifiersState::SHIFT;
        let none = ModifiersState::empty();
        assert_eq!(
            Action::from_key(&Key::Named(NamedKey::Tab), shift),
            Some(Action::PreviousTab)
        );
        assert_eq!(
            Action::from_key(&Key::Named(NamedKey::ArrowRight), shift),
            Some(Action::Adjust(10.0))
        );
        assert_eq!(
            Action::from_key(&Key::Named(NamedKey::ArrowLeft), none),
            Some(Action::Adjust(-1.0))
        );
        assert_eq!(Action::from_key(&Key::Named(NamedKey::Enter), none), None);
    }

    #[test]
    fn tabs_and_selection_wrap() {
        let mut controls = controls(ShaderVariant::Lab, None);
        let now = Instant::now();
        assert_eq!(controls.current_tab(), "Global");
        controls.apply(Action::PreviousTab, now);
        assert_eq!(controls.current_tab(), "Theme");
        controls.apply(Action::NextTab, now);
        controls.apply(Action::NextTab, now);
        assert_eq!(controls.current_tab(), "Emblem");
        controls.apply(Action::SelectPrevious, now);
        assert_eq!(controls.selected().map(|d| d.key), Some("rim"));
    }

    #[test]
    fn adjusting_moves_the_selected_parameter() {
        let mut controls = controls(ShaderVariant::Basic, None);
        let now = Instant::now();
        assert_eq!(controls.selected().map(|d| d.key), Some("hue"));
        controls.apply(Action::Adjust(10.0), now);
        let hue = controls.store().get("hue").and_then(|v| v.as_scalar()).unwrap();
        assert!((hue - 0.6).abs() < 1e-5);
        assert!(controls.status_line().starts_with("basic [Colors] Hue: 0.600"));
    }

    #[test]
    fn changes_persist_after_quiet_period() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.toml");
        let mut controls = controls(ShaderVariant::Basic, Some(path.clone()));
        let start = Instant::now();

        controls.apply(Action::Adjust(1.0), start);
        assert_eq!(
            controls.on_idle(start + Duration::from_millis(50)),
            Some(start + Duration::from_millis(150))
        );
        assert!(!path.exists());

        assert_eq!(controls.on_idle(start + Duration::from_millis(200)), None);
        let stored = StoredState::load_or_default(&path).unwrap();
        assert_eq!(
            stored.values_for(ShaderVariant::Basic).and_then(|v| v.get("hue")),
            controls.store().get("hue").as_ref()
        );
    }

    #[test]
    fn navigation_alone_does_not_schedule_a_save() {
        let mut controls = controls(ShaderVariant::Lab, None);
        let now = Instant::now();
        controls.apply(Action::NextTab, now);
        controls.apply(Action::ShareLink, now);
        assert_eq!(controls.on_idle(now), None);
    }

    #[test]
    fn skins_are_saved_and_written_immediately() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.toml");
        let mut controls = controls(ShaderVariant::Lab, Some(path.clone()));
        controls.apply(Action::SaveSkin, Instant::now());
        controls.apply(Action::SaveSkin, Instant::now());
        let stored = StoredState::load_or_default(&path).unwrap();
        let names: Vec<_> = stored.skins.iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, ["Skin 1", "Skin 2"]);
    }

    #[test]
    fn saved_skins_can_be_loaded_back() {
        let mut controls = controls(ShaderVariant::Basic, None);
        let now = Instant::now();
        controls.apply(Action::SaveSkin, now);
        controls.apply(Action::Adjust(30.0), now);
        controls.apply(Action::SaveSkin, now);
        let hue = controls.store().get("hue").and_then(|v| v.as_scalar()).unwrap();
        assert!((hue - 0.8).abs() < 1e-5);

        controls.apply(Action::NextSkin, now);
        assert_eq!(controls.store().get("hue"), Some(ParamValue::Scalar(0.5)));
        assert!(controls.status_line().ends_with("| skin Skin 1"));
    }

    #[test]
    fn presets_and_themes_cycle() {
        let mut controls = controls(ShaderVariant::Lab, None);
        let now = Instant::now();
        controls.apply(Action::NextPreset, now);
        assert_eq!(controls.store().get("emblemHue"), Some(ParamValue::Scalar(0.62)));
        controls.apply(Action::NextPreset, now);
        assert_eq!(controls.store().get("emblemHue"), Some(ParamValue::Scalar(0.82)));

        controls.apply(Action::NextTheme, now);
        assert!(controls.status_line().ends_with("| theme ember"));
        controls.apply(Action::Reset, now);
        assert_eq!(controls.store().get("emblemHue"), Some(ParamValue::Scalar(0.6)));
    }

    #[test]
    fn exports_reflect_current_values() {
        let mut controls = controls(ShaderVariant::Basic, None);
        controls.apply(Action::Adjust(-50.0), Instant::now());
        assert_eq!(controls.share_query(), "h=0&s=0.333&i=0.5&m=1");
        let json: serde_json::Value = serde_json::from_str(&controls.export_json().unwrap()).unwrap();
        assert_eq!(json["variant"], "basic");
    }

    #[test]
    fn escape_exits() {
        let mut controls = controls(ShaderVariant::Lab, None);
        assert_eq!(controls.apply(Action::Quit, Instant::now()), KeyResponse::Exit);
    }
}
