//! The settings store: named profiles plus cross-profile global state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{Result, SettingsError};
use crate::types::ProfileSettings;
use crate::DEFAULT_PROFILE;

/// Owns every profile and the state that lives outside profiles.
///
/// Profile resolution, chat/character bindings, per-chat enablement, and
/// group-character toggles all go through here. The whole store serializes
/// as one JSON document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsStore {
    profiles: BTreeMap<String, ProfileSettings>,
    selected: String,
    character_profiles: BTreeMap<String, String>,
    chat_profiles: BTreeMap<String, String>,
    chats_enabled: BTreeMap<String, bool>,
    global_toggle_state: bool,
    disabled_group_characters: BTreeMap<String, BTreeSet<String>>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        let _ = profiles.insert(DEFAULT_PROFILE.to_owned(), ProfileSettings::default());
        Self {
            profiles,
            selected: DEFAULT_PROFILE.to_owned(),
            character_profiles: BTreeMap::new(),
            chat_profiles: BTreeMap::new(),
            chats_enabled: BTreeMap::new(),
            global_toggle_state: true,
            disabled_group_characters: BTreeMap::new(),
        }
    }
}

impl SettingsStore {
    /// Create a store holding only the `Default` profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Profiles ────────────────────────────────────────────────────────

    /// Names of all profiles, sorted.
    #[must_use]
    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// The currently selected profile name.
    #[must_use]
    pub fn selected_profile(&self) -> &str {
        &self.selected
    }

    /// Look up a profile by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ProfileSettings> {
        self.profiles.get(name)
    }

    /// Settings of the currently selected profile.
    ///
    /// The selected profile always exists; every mutation path maintains
    /// that invariant.
    #[must_use]
    pub fn settings(&self) -> &ProfileSettings {
        self.profiles
            .get(&self.selected)
            .unwrap_or_else(|| self.default_profile())
    }

    fn default_profile(&self) -> &ProfileSettings {
        // The Default profile is recreated on delete, so a miss here means
        // the store was hand-edited; fall back to any remaining profile.
        self.profiles
            .values()
            .next()
            .expect("store always holds at least one profile")
    }

    /// Select a profile by name.
    pub fn select(&mut self, name: &str) -> Result<()> {
        if !self.profiles.contains_key(name) {
            return Err(SettingsError::UnknownProfile(name.to_owned()));
        }
        if self.selected != name {
            info!(profile = name, "switching settings profile");
            self.selected = name.to_owned();
        }
        Ok(())
    }

    /// Save settings under a profile name, creating or overwriting it.
    pub fn save_profile(&mut self, name: &str, mut settings: ProfileSettings) -> Result<()> {
        if name.trim().is_empty() {
            return Err(SettingsError::InvalidName(name.to_owned()));
        }
        let repairs = settings.sanitize();
        if !repairs.is_empty() {
            debug!(profile = name, ?repairs, "repaired settings on save");
        }
        let _ = self.profiles.insert(name.to_owned(), settings);
        Ok(())
    }

    /// Create a fresh profile cloned from the current one and select it.
    ///
    /// Picks the first free `New Profile`, `New Profile 1`, ... name.
    pub fn create_profile(&mut self) -> String {
        let mut name = "New Profile".to_owned();
        let mut counter = 1;
        while self.profiles.contains_key(&name) {
            name = format!("New Profile {counter}");
            counter += 1;
        }
        let _ = self.profiles.insert(name.clone(), self.settings().clone());
        self.selected = name.clone();
        name
    }

    /// Delete a profile.
    ///
    /// The last remaining profile cannot be deleted. Character and chat
    /// bindings pointing at the deleted profile are removed; if it was
    /// selected, selection falls back to `Default` (recreated if needed).
    pub fn delete_profile(&mut self, name: &str) -> Result<()> {
        if !self.profiles.contains_key(name) {
            return Err(SettingsError::UnknownProfile(name.to_owned()));
        }
        if self.profiles.len() == 1 {
            return Err(SettingsError::LastProfile);
        }
        let _ = self.profiles.remove(name);
        self.character_profiles.retain(|_, bound| bound != name);
        self.chat_profiles.retain(|_, bound| bound != name);

        if self.selected == name {
            if !self.profiles.contains_key(DEFAULT_PROFILE) {
                let _ = self
                    .profiles
                    .insert(DEFAULT_PROFILE.to_owned(), ProfileSettings::default());
            }
            self.selected = DEFAULT_PROFILE.to_owned();
        }
        info!(profile = name, "deleted settings profile");
        Ok(())
    }

    /// Rename a profile, updating selection and all bindings.
    pub fn rename_profile(&mut self, old: &str, new: &str) -> Result<()> {
        if new.trim().is_empty() || self.profiles.contains_key(new) {
            return Err(SettingsError::InvalidName(new.to_owned()));
        }
        let Some(settings) = self.profiles.remove(old) else {
            return Err(SettingsError::UnknownProfile(old.to_owned()));
        };
        let _ = self.profiles.insert(new.to_owned(), settings);
        for bound in self.character_profiles.values_mut() {
            if bound == old {
                *bound = new.to_owned();
            }
        }
        for bound in self.chat_profiles.values_mut() {
            if bound == old {
                *bound = new.to_owned();
            }
        }
        if self.selected == old {
            self.selected = new.to_owned();
        }
        Ok(())
    }

    /// Serialize one profile for export.
    pub fn export_profile(&self, name: &str) -> Result<String> {
        let settings = self
            .profiles
            .get(name)
            .ok_or_else(|| SettingsError::UnknownProfile(name.to_owned()))?;
        Ok(serde_json::to_string_pretty(settings)?)
    }

    /// Import a profile from JSON.
    ///
    /// Parsing happens before any mutation, so a malformed document leaves
    /// the store untouched.
    pub fn import_profile(&mut self, name: &str, json: &str) -> Result<()> {
        let settings: ProfileSettings = serde_json::from_str(json)?;
        self.save_profile(name, settings)
    }

    // ─── Overrides and resolution ────────────────────────────────────────

    /// Bind a character to a profile, or clear the binding with `None`.
    pub fn bind_character(&mut self, character_key: &str, profile: Option<&str>) -> Result<()> {
        self.bind(character_key, profile, /* chat */ false)
    }

    /// Bind a chat to a profile, or clear the binding with `None`.
    pub fn bind_chat(&mut self, chat_id: &str, profile: Option<&str>) -> Result<()> {
        self.bind(chat_id, profile, /* chat */ true)
    }

    fn bind(&mut self, key: &str, profile: Option<&str>, chat: bool) -> Result<()> {
        let map = if chat {
            &mut self.chat_profiles
        } else {
            &mut self.character_profiles
        };
        match profile {
            Some(name) => {
                if !self.profiles.contains_key(name) {
                    return Err(SettingsError::UnknownProfile(name.to_owned()));
                }
                let _ = map.insert(key.to_owned(), name.to_owned());
            }
            None => {
                let _ = map.remove(key);
            }
        }
        Ok(())
    }

    /// Resolve the active profile name for a chat/character pair.
    ///
    /// Priority: chat override > character override > current selection >
    /// `Default`. Bindings to profiles that no longer exist are skipped.
    #[must_use]
    pub fn resolve_active(&self, chat_id: &str, character_key: &str) -> &str {
        let candidates = [
            self.chat_profiles.get(chat_id),
            self.character_profiles.get(character_key),
            Some(&self.selected),
        ];
        for candidate in candidates.into_iter().flatten() {
            if self.profiles.contains_key(candidate) {
                return candidate;
            }
        }
        DEFAULT_PROFILE
    }

    /// Select the profile resolved for a chat/character pair.
    ///
    /// Called on chat switch. Recreates `Default` if resolution bottoms out
    /// on a missing hardwired profile.
    pub fn auto_select(&mut self, chat_id: &str, character_key: &str) {
        let resolved = self.resolve_active(chat_id, character_key).to_owned();
        if !self.profiles.contains_key(&resolved) {
            let _ = self
                .profiles
                .insert(resolved.clone(), ProfileSettings::default());
        }
        self.selected = resolved;
    }

    // ─── Chat enablement ─────────────────────────────────────────────────

    /// Whether memory is enabled for a chat.
    #[must_use]
    pub fn is_chat_enabled(&self, chat_id: &str) -> bool {
        let settings = self.settings();
        if settings.misc.use_global_toggle_state {
            return self.global_toggle_state;
        }
        self.chats_enabled
            .get(chat_id)
            .copied()
            .unwrap_or(settings.misc.default_chat_enabled)
    }

    /// Set or toggle memory enablement for a chat. Returns the new state.
    pub fn toggle_chat_enabled(&mut self, chat_id: &str, value: Option<bool>) -> bool {
        let current = self.is_chat_enabled(chat_id);
        let new = value.unwrap_or(!current);
        if new == current {
            return current;
        }
        if self.settings().misc.use_global_toggle_state {
            self.global_toggle_state = new;
        } else {
            let _ = self.chats_enabled.insert(chat_id.to_owned(), new);
        }
        info!(chat = chat_id, enabled = new, "chat memory toggled");
        new
    }

    // ─── Group character toggles ─────────────────────────────────────────

    /// Whether a character is enabled for summarization in a group chat.
    ///
    /// Non-group chats (`group_id == None`) always report enabled.
    #[must_use]
    pub fn is_character_enabled(&self, group_id: Option<&str>, character_key: &str) -> bool {
        let Some(group) = group_id else { return true };
        self.disabled_group_characters
            .get(group)
            .is_none_or(|disabled| !disabled.contains(character_key))
    }

    /// Toggle a character's summarization in a group chat. Returns the new
    /// enabled state.
    pub fn toggle_character_enabled(&mut self, group_id: &str, character_key: &str) -> bool {
        let disabled = self
            .disabled_group_characters
            .entry(group_id.to_owned())
            .or_default();
        if disabled.remove(character_key) {
            true
        } else {
            let _ = disabled.insert(character_key.to_owned());
            false
        }
    }

    /// The disabled-character set for a chat, if any.
    #[must_use]
    pub fn disabled_characters(&self, group_id: &str) -> Option<&BTreeSet<String>> {
        self.disabled_group_characters.get(group_id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // -- Basics --

    #[test]
    fn new_store_has_default_profile() {
        let store = SettingsStore::new();
        assert_eq!(store.profile_names(), vec![DEFAULT_PROFILE]);
        assert_eq!(store.selected_profile(), DEFAULT_PROFILE);
    }

    #[test]
    fn select_unknown_profile_errors() {
        let mut store = SettingsStore::new();
        assert_matches!(
            store.select("Nope"),
            Err(SettingsError::UnknownProfile(name)) if name == "Nope"
        );
    }

    #[test]
    fn save_and_select() {
        let mut store = SettingsStore::new();
        let mut settings = ProfileSettings::default();
        settings.summarization.auto_summarize = false;
        store.save_profile("Roleplay", settings).unwrap();
        store.select("Roleplay").unwrap();
        assert!(!store.settings().summarization.auto_summarize);
    }

    #[test]
    fn save_sanitizes_broken_prompt() {
        let mut store = SettingsStore::new();
        let mut settings = ProfileSettings::default();
        settings.summarization.prompt = "no macro".into();
        store.save_profile("P", settings).unwrap();
        assert!(store.get("P").unwrap().summarization.prompt.contains("{{message}}"));
    }

    #[test]
    fn create_profile_picks_free_name() {
        let mut store = SettingsStore::new();
        assert_eq!(store.create_profile(), "New Profile");
        assert_eq!(store.create_profile(), "New Profile 1");
        assert_eq!(store.selected_profile(), "New Profile 1");
    }

    // -- Delete / rename --

    #[test]
    fn cannot_delete_last_profile() {
        let mut store = SettingsStore::new();
        assert_matches!(
            store.delete_profile(DEFAULT_PROFILE),
            Err(SettingsError::LastProfile)
        );
    }

    #[test]
    fn delete_selected_falls_back_to_default() {
        let mut store = SettingsStore::new();
        let name = store.create_profile();
        store.delete_profile(&name).unwrap();
        assert_eq!(store.selected_profile(), DEFAULT_PROFILE);
    }

    #[test]
    fn delete_removes_bindings() {
        let mut store = SettingsStore::new();
        let name = store.create_profile();
        store.bind_character("kira.png", Some(&name)).unwrap();
        store.bind_chat("chat-1", Some(&name)).unwrap();
        store.delete_profile(&name).unwrap();
        assert_eq!(store.resolve_active("chat-1", "kira.png"), DEFAULT_PROFILE);
    }

    #[test]
    fn rename_updates_selection_and_bindings() {
        let mut store = SettingsStore::new();
        let name = store.create_profile();
        store.bind_chat("chat-1", Some(&name)).unwrap();
        store.rename_profile(&name, "Adventure").unwrap();
        assert_eq!(store.selected_profile(), "Adventure");
        assert_eq!(store.resolve_active("chat-1", ""), "Adventure");
    }

    #[test]
    fn rename_to_taken_name_errors() {
        let mut store = SettingsStore::new();
        let name = store.create_profile();
        assert_matches!(
            store.rename_profile(&name, DEFAULT_PROFILE),
            Err(SettingsError::InvalidName(_))
        );
    }

    // -- Import / export --

    #[test]
    fn export_import_roundtrip() {
        let mut store = SettingsStore::new();
        let mut settings = ProfileSettings::default();
        settings.injection.separator = "\n- ".into();
        store.save_profile("Export Me", settings).unwrap();

        let json = store.export_profile("Export Me").unwrap();
        let mut other = SettingsStore::new();
        other.import_profile("Imported", &json).unwrap();
        assert_eq!(other.get("Imported").unwrap().injection.separator, "\n- ");
    }

    #[test]
    fn import_parse_failure_leaves_store_untouched() {
        let mut store = SettingsStore::new();
        let before = store.clone();
        let result = store.import_profile("Broken", "{not json");
        assert_matches!(result, Err(SettingsError::Json(_)));
        assert_eq!(store, before);
    }

    // -- Resolution chain --

    #[test]
    fn resolution_prefers_chat_then_character_then_selected() {
        let mut store = SettingsStore::new();
        store.save_profile("ChatProf", ProfileSettings::default()).unwrap();
        store.save_profile("CharProf", ProfileSettings::default()).unwrap();
        store.save_profile("SelProf", ProfileSettings::default()).unwrap();
        store.select("SelProf").unwrap();

        assert_eq!(store.resolve_active("c1", "k1"), "SelProf");

        store.bind_character("k1", Some("CharProf")).unwrap();
        assert_eq!(store.resolve_active("c1", "k1"), "CharProf");

        store.bind_chat("c1", Some("ChatProf")).unwrap();
        assert_eq!(store.resolve_active("c1", "k1"), "ChatProf");
    }

    #[test]
    fn auto_select_applies_resolution() {
        let mut store = SettingsStore::new();
        store.save_profile("Bound", ProfileSettings::default()).unwrap();
        store.bind_chat("c1", Some("Bound")).unwrap();
        store.auto_select("c1", "");
        assert_eq!(store.selected_profile(), "Bound");
    }

    // -- Enablement --

    #[test]
    fn chat_enabled_defaults_from_profile() {
        let store = SettingsStore::new();
        assert!(store.is_chat_enabled("any-chat"));
    }

    #[test]
    fn toggle_chat_enabled_flips_state() {
        let mut store = SettingsStore::new();
        assert!(!store.toggle_chat_enabled("c1", None));
        assert!(!store.is_chat_enabled("c1"));
        assert!(store.toggle_chat_enabled("c1", Some(true)));
        assert!(store.is_chat_enabled("c1"));
    }

    #[test]
    fn global_toggle_state_overrides_per_chat() {
        let mut store = SettingsStore::new();
        let mut settings = ProfileSettings::default();
        settings.misc.use_global_toggle_state = true;
        store.save_profile(DEFAULT_PROFILE, settings).unwrap();

        let _ = store.toggle_chat_enabled("c1", Some(false));
        // Global state flipped, so every chat reports disabled.
        assert!(!store.is_chat_enabled("c2"));
    }

    // -- Character toggles --

    #[test]
    fn characters_enabled_outside_groups() {
        let store = SettingsStore::new();
        assert!(store.is_character_enabled(None, "kira.png"));
    }

    #[test]
    fn toggle_character_in_group() {
        let mut store = SettingsStore::new();
        assert!(!store.toggle_character_enabled("group-1", "kira.png"));
        assert!(!store.is_character_enabled(Some("group-1"), "kira.png"));
        assert!(store.is_character_enabled(Some("group-1"), "other.png"));
        assert!(store.toggle_character_enabled("group-1", "kira.png"));
        assert!(store.is_character_enabled(Some("group-1"), "kira.png"));
    }

    // -- Serde --

    #[test]
    fn store_serde_roundtrip() {
        let mut store = SettingsStore::new();
        let _ = store.create_profile();
        store.bind_chat("c1", Some("New Profile")).unwrap();
        let _ = store.toggle_chat_enabled("c1", Some(false));

        let json = serde_json::to_string(&store).unwrap();
        let back: SettingsStore = serde_json::from_str(&json).unwrap();
        assert_eq!(store, back);
    }
}
