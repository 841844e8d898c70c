//! Menu registries for the main (reporting), admin and top menus.
//!
//! Items are keyed by `(category, name)`; a `None` name is the category entry
//! itself. Renames and URL edits are recorded and applied when a snapshot is
//! taken, so they also affect items added after the edit was requested.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_i18n::Translator;

pub const DEFAULT_ORDER: i32 = 10;

/// Category that top-level admin entries are filed under
pub const ADMIN_SETTINGS_CATEGORY: &str = "General_Settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuKind {
    Main,
    Admin,
    Top,
}

impl MenuKind {
    /// Event posted the first time the menu is read, so plugins can add items
    pub fn collect_event(&self) -> &'static str {
        match self {
            MenuKind::Main => "Menu.Reporting.addItems",
            MenuKind::Admin => "Menu.Admin.addItems",
            MenuKind::Top => "Menu.Top.addItems",
        }
    }
}

impl fmt::Display for MenuKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MenuKind::Main => "main",
            MenuKind::Admin => "admin",
            MenuKind::Top => "top",
        };
        f.write_str(name)
    }
}

fn default_displayed() -> bool {
    true
}

fn default_order() -> i32 {
    DEFAULT_ORDER
}

/// A menu item as registered, labels untranslated.
///
/// This is also the JSON shape plugins push into the item list carried by
/// the menu collection events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub category: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: String,
    /// Hidden items stay registered but are left out of snapshots
    #[serde(default = "default_displayed")]
    pub displayed: bool,
    #[serde(default = "default_order")]
    pub order: i32,
    /// Raw HTML shown instead of a link (top menu only)
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
}

impl MenuItem {
    pub fn link(category: impl Into<String>, name: Option<&str>, url: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.map(str::to_string),
            url: url.into(),
            displayed: true,
            order: DEFAULT_ORDER,
            html: None,
            tooltip: None,
        }
    }

    pub fn html(category: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            ..Self::link(category, None, "")
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn displayed(mut self, displayed: bool) -> Self {
        self.displayed = displayed;
        self
    }

    pub fn with_tooltip(mut self, tooltip: Option<String>) -> Self {
        self.tooltip = tooltip;
        self
    }

    fn matches(&self, category: &str, name: Option<&str>) -> bool {
        self.category == category && self.name.as_deref() == name
    }
}

/// A visible menu entry with translated labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub category: String,
    pub name: Option<String>,
    pub url: String,
    pub order: i32,
    pub html: Option<String>,
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone)]
enum MenuEdit {
    Rename {
        category: String,
        name: Option<String>,
        new_category: String,
        new_name: Option<String>,
    },
    EditUrl {
        category: String,
        name: Option<String>,
        url: String,
    },
}

impl MenuEdit {
    fn apply(&self, items: &mut [MenuItem]) {
        match self {
            // Without a name the whole category moves
            MenuEdit::Rename { category, name: None, new_category, .. } => {
                for item in items.iter_mut().filter(|item| &item.category == category) {
                    item.category = new_category.clone();
                }
            }
            MenuEdit::Rename { category, name, new_category, new_name } => {
                for item in items.iter_mut().filter(|item| item.matches(category, name.as_deref())) {
                    item.category = new_category.clone();
                    item.name = new_name.clone();
                }
            }
            MenuEdit::EditUrl { category, name, url } => {
                for item in items.iter_mut().filter(|item| item.matches(category, name.as_deref())) {
                    item.url = url.clone();
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct MenuState {
    items: Vec<MenuItem>,
    edits: Vec<MenuEdit>,
    collected: bool,
}

/// One menu: items, pending edits, and whether plugins were asked for items yet
#[derive(Debug)]
pub struct MenuRegistry {
    kind: MenuKind,
    state: RwLock<MenuState>,
}

impl MenuRegistry {
    pub fn new(kind: MenuKind) -> Self {
        Self {
            kind,
            state: RwLock::new(MenuState::default()),
        }
    }

    pub fn kind(&self) -> MenuKind {
        self.kind
    }

    /// Add an item, replacing any item with the same category and name in place
    pub fn add(&self, item: MenuItem) {
        let mut state = self.state.write();
        match state
            .items
            .iter_mut()
            .find(|existing| existing.matches(&item.category, item.name.as_deref()))
        {
            Some(existing) => *existing = item,
            None => state.items.push(item),
        }
    }

    pub fn rename(&self, category: &str, name: Option<&str>, new_category: &str, new_name: Option<&str>) {
        self.state.write().edits.push(MenuEdit::Rename {
            category: category.to_string(),
            name: name.map(str::to_string),
            new_category: new_category.to_string(),
            new_name: new_name.map(str::to_string),
        });
    }

    pub fn edit_url(&self, category: &str, name: Option<&str>, url: &str) {
        self.state.write().edits.push(MenuEdit::EditUrl {
            category: category.to_string(),
            name: name.map(str::to_string),
            url: url.to_string(),
        });
    }

    /// Registered items, hidden ones included
    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    pub fn is_collected(&self) -> bool {
        self.state.read().collected
    }

    /// Flag the menu as collected. Returns true only for the first caller.
    pub(crate) fn mark_collected(&self) -> bool {
        let mut state = self.state.write();
        !std::mem::replace(&mut state.collected, true)
    }

    /// Visible entries with edits applied, sorted by order then insertion,
    /// labels translated
    pub fn entries(&self, translator: &Translator) -> Vec<MenuEntry> {
        let mut items = {
            let state = self.state.read();
            let mut items = state.items.clone();
            for edit in &state.edits {
                edit.apply(&mut items);
            }
            items
        };

        items.retain(|item| item.displayed);
        items.sort_by_key(|item| item.order);

        items
            .into_iter()
            .map(|item| MenuEntry {
                category: translator.translate_exception(&item.category, &[]),
                name: item.name.map(|name| translator.translate_exception(&name, &[])),
                url: item.url,
                order: item.order,
                html: item.html,
                tooltip: item.tooltip,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_i18n::{Catalog, FormatPolicy};

    fn translator() -> Translator {
        let mut catalog = Catalog::new();
        catalog.insert("General", "Settings", "Settings");
        catalog.insert("General", "Visitors", "Visitors");
        catalog.insert("Goals", "Goals", "Goals");
        Translator::new(catalog, FormatPolicy::Strict)
    }

    #[test]
    fn test_sorted_by_order_then_insertion() {
        let menu = MenuRegistry::new(MenuKind::Main);
        menu.add(MenuItem::link("General_Visitors", Some("Overview"), "/visitors").with_order(5));
        menu.add(MenuItem::link("Goals_Goals", None, "/goals").with_order(20));
        menu.add(MenuItem::link("General_Visitors", Some("Log"), "/log").with_order(5));
        menu.add(MenuItem::link("Dashboard", None, "/dashboard").with_order(1));

        let names: Vec<(String, Option<String>)> = menu
            .entries(&translator())
            .into_iter()
            .map(|entry| (entry.category, entry.name))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Dashboard".to_string(), None),
                ("Visitors".to_string(), Some("Overview".to_string())),
                ("Visitors".to_string(), Some("Log".to_string())),
                ("Goals".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_hidden_items_excluded() {
        let menu = MenuRegistry::new(MenuKind::Admin);
        menu.add(MenuItem::link(ADMIN_SETTINGS_CATEGORY, Some("Users"), "/users").displayed(false));
        menu.add(MenuItem::link(ADMIN_SETTINGS_CATEGORY, Some("Sites"), "/sites"));

        let entries = menu.entries(&translator());
        assert_eq!(menu.len(), 2);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, "Settings");
        assert_eq!(entries[0].name.as_deref(), Some("Sites"));
    }

    #[test]
    fn test_same_key_replaces_in_place() {
        let menu = MenuRegistry::new(MenuKind::Main);
        menu.add(MenuItem::link("A", Some("x"), "/old"));
        menu.add(MenuItem::link("B", None, "/b"));
        menu.add(MenuItem::link("A", Some("x"), "/new"));

        let entries = menu.entries(&translator());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "/new");
        assert_eq!(entries[1].category, "B");
    }

    #[test]
    fn test_rename_category_and_entry() {
        let menu = MenuRegistry::new(MenuKind::Main);
        menu.add(MenuItem::link("Actions", Some("Pages"), "/pages"));
        menu.add(MenuItem::link("Actions", Some("Downloads"), "/downloads"));

        menu.rename("Actions", None, "Behaviour", None);
        menu.rename("Behaviour", Some("Pages"), "Behaviour", Some("Page URLs"));

        let entries = menu.entries(&translator());
        assert!(entries.iter().all(|entry| entry.category == "Behaviour"));
        assert_eq!(entries[0].name.as_deref(), Some("Page URLs"));
        assert_eq!(entries[1].name.as_deref(), Some("Downloads"));
    }

    #[test]
    fn test_edits_apply_to_items_added_later() {
        let menu = MenuRegistry::new(MenuKind::Main);
        menu.edit_url("Referrers", Some("Websites"), "/referrers/websites?period=day");
        menu.add(MenuItem::link("Referrers", Some("Websites"), "/referrers/websites"));

        let entries = menu.entries(&translator());
        assert_eq!(entries[0].url, "/referrers/websites?period=day");
    }

    #[test]
    fn test_html_item_and_tooltip() {
        let menu = MenuRegistry::new(MenuKind::Top);
        menu.add(MenuItem::html("Widgets", "<b>Widgets</b>").with_tooltip(Some("Embed widgets".into())));

        let entries = menu.entries(&translator());
        assert_eq!(entries[0].html.as_deref(), Some("<b>Widgets</b>"));
        assert_eq!(entries[0].tooltip.as_deref(), Some("Embed widgets"));
        assert!(entries[0].url.is_empty());
    }

    #[test]
    fn test_item_json_defaults() {
        let item: MenuItem = serde_json::from_value(serde_json::json!({
            "category": "General_Settings",
            "name": "ActivityLog_MenuTitle",
            "url": "index.php?module=ActivityLog",
        }))
        .unwrap();
        assert!(item.displayed);
        assert_eq!(item.order, DEFAULT_ORDER);
        assert_eq!(item.html, None);
    }

    #[test]
    fn test_mark_collected_once() {
        let menu = MenuRegistry::new(MenuKind::Top);
        assert!(!menu.is_collected());
        assert!(menu.mark_collected());
        assert!(!menu.mark_collected());
        assert!(menu.is_collected());
    }
}
