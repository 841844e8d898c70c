//! Composition root.
//!
//! [`Host`] owns the dispatcher, translator, option store, menus and plugin
//! manager, and exposes the operations plugins and application code use:
//! event posting, translation, options and menu registration.

use crate::menu::{MenuEntry, MenuItem, MenuKind, MenuRegistry, ADMIN_SETTINGS_CATEGORY};
use crate::options::{InMemoryOptionStore, OptionStore};
use serde_json::Value;
use std::sync::Arc;
use tally_events::{
    DispatchReport, DispatcherConfig, EventDispatcher, EventError, EventName, EventParameters,
    Plugin, PluginConfig, PluginContext, PluginFactory, PluginFilter, PluginManager, PluginName,
    PluginSystemError,
};
use tally_i18n::{Arg, TranslationError, Translator};
use tracing::{info, warn};

pub struct Host {
    dispatcher: Arc<EventDispatcher>,
    translator: Arc<Translator>,
    options: Arc<dyn OptionStore>,
    main_menu: MenuRegistry,
    admin_menu: MenuRegistry,
    top_menu: MenuRegistry,
    plugins: PluginManager,
}

impl Host {
    /// Build a host with an in-memory option store
    pub fn new(dispatcher_config: DispatcherConfig, plugin_config: PluginConfig, translator: Translator) -> Self {
        Self::with_option_store(
            dispatcher_config,
            plugin_config,
            translator,
            Arc::new(InMemoryOptionStore::new()),
        )
    }

    pub fn with_option_store(
        dispatcher_config: DispatcherConfig,
        plugin_config: PluginConfig,
        translator: Translator,
        options: Arc<dyn OptionStore>,
    ) -> Self {
        let dispatcher = Arc::new(EventDispatcher::new(dispatcher_config));
        let translator = Arc::new(translator);

        // Services plugins can pull from their context
        let mut context = PluginContext::new(dispatcher.clone());
        context.add_shared_provider(translator.clone());
        context.add_provider(options.clone());
        context.add_metadata("host_version", env!("CARGO_PKG_VERSION"));

        Self {
            dispatcher,
            translator,
            options,
            main_menu: MenuRegistry::new(MenuKind::Main),
            admin_menu: MenuRegistry::new(MenuKind::Admin),
            top_menu: MenuRegistry::new(MenuKind::Top),
            plugins: PluginManager::new(context, plugin_config),
        }
    }

    pub fn dispatcher(&self) -> Arc<EventDispatcher> {
        self.dispatcher.clone()
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Make a shared service available to plugins loaded from now on
    pub fn provide<T: Send + Sync + 'static>(&mut self, provider: Arc<T>) {
        self.plugins.context_template_mut().add_shared_provider(provider);
    }

    /// Shared service registered with [`provide`](Self::provide)
    pub fn provider<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.plugins.context_template().shared_provider::<T>()
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    // Events

    pub fn post_event(
        &self,
        event_name: impl Into<EventName>,
        parameters: &mut EventParameters,
        pending: bool,
        plugins: Option<&PluginFilter>,
    ) -> DispatchReport {
        self.dispatcher.post_event(event_name, parameters, pending, plugins)
    }

    /// Register an observer that belongs to no plugin
    pub fn add_action<F>(&self, event_name: impl Into<EventName>, callback: F) -> u64
    where
        F: Fn(&mut EventParameters) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.dispatcher.add_observer(event_name, callback)
    }

    pub fn post_test_event(
        &self,
        event_name: impl Into<EventName>,
        parameters: &mut EventParameters,
        pending: bool,
        plugins: Option<&PluginFilter>,
    ) -> Option<DispatchReport> {
        self.dispatcher.post_test_event(event_name, parameters, pending, plugins)
    }

    // Translations

    pub fn translate(&self, key: &str, args: &[Arg]) -> Result<String, TranslationError> {
        self.translator.translate(key, args)
    }

    pub fn translate_exception(&self, message: &str, args: &[Arg]) -> String {
        self.translator.translate_exception(message, args)
    }

    // Options

    pub fn get_option(&self, name: &str) -> Option<String> {
        self.options.get(name)
    }

    pub fn set_option(&self, name: &str, value: &str, autoload: bool) {
        self.options.set(name, value, autoload);
    }

    pub fn option_store(&self) -> Arc<dyn OptionStore> {
        self.options.clone()
    }

    // Main menu

    pub fn add_menu(&self, category: &str, name: Option<&str>, url: &str, displayed: bool, order: i32) {
        self.main_menu.add(MenuItem::link(category, name, url).displayed(displayed).with_order(order));
    }

    pub fn rename_menu_entry(
        &self,
        category: &str,
        name: Option<&str>,
        new_category: &str,
        new_name: Option<&str>,
    ) {
        self.main_menu.rename(category, name, new_category, new_name);
    }

    pub fn edit_menu_url(&self, category: &str, name: Option<&str>, url: &str) {
        self.main_menu.edit_url(category, name, url);
    }

    pub fn get_menu(&self) -> Vec<MenuEntry> {
        self.menu_entries(&self.main_menu)
    }

    // Admin menu

    /// Add a top-level admin entry, filed under the settings category
    pub fn add_admin_menu(&self, name: &str, url: &str, displayed: bool, order: i32) {
        self.add_admin_sub_menu(ADMIN_SETTINGS_CATEGORY, name, url, displayed, order);
    }

    pub fn add_admin_sub_menu(&self, menu: &str, sub_menu: &str, url: &str, displayed: bool, order: i32) {
        self.admin_menu
            .add(MenuItem::link(menu, Some(sub_menu), url).displayed(displayed).with_order(order));
    }

    pub fn rename_admin_menu_entry(&self, original: &str, renamed: &str) {
        self.admin_menu.rename(original, None, renamed, None);
    }

    pub fn get_admin_menu(&self) -> Vec<MenuEntry> {
        self.menu_entries(&self.admin_menu)
    }

    // Top menu

    /// Add a top menu entry. With `is_html` the data is markup shown as is,
    /// otherwise it is the entry URL.
    pub fn add_top_menu(
        &self,
        name: &str,
        data: &str,
        displayed: bool,
        order: i32,
        is_html: bool,
        tooltip: Option<&str>,
    ) {
        let item = if is_html {
            MenuItem::html(name, data)
        } else {
            MenuItem::link(name, None, data)
        };
        self.top_menu.add(
            item.displayed(displayed)
                .with_order(order)
                .with_tooltip(tooltip.map(str::to_string)),
        );
    }

    pub fn rename_top_menu_entry(&self, original: &str, renamed: &str) {
        self.top_menu.rename(original, None, renamed, None);
    }

    pub fn get_top_menu(&self) -> Vec<MenuEntry> {
        self.menu_entries(&self.top_menu)
    }

    fn menu_entries(&self, menu: &MenuRegistry) -> Vec<MenuEntry> {
        self.collect_menu_items(menu);
        menu.entries(&self.translator)
    }

    /// Ask plugins for menu items the first time a menu is read.
    ///
    /// Observers receive a JSON array as the first parameter and push items
    /// in the [`MenuItem`] shape onto it.
    fn collect_menu_items(&self, menu: &MenuRegistry) {
        if !menu.mark_collected() {
            return;
        }

        let event = menu.kind().collect_event();
        let mut params = EventParameters::from(vec![Value::Array(Vec::new())]);
        let report = self.dispatcher.dispatch(event, &mut params);
        if !report.is_success() {
            warn!("⚠️ {} observer(s) failed while building the {} menu", report.failures.len(), menu.kind());
        }

        let items = match params.into_values().into_iter().next() {
            Some(Value::Array(items)) => items,
            _ => {
                warn!("⚠️ {} replaced its item list; no items collected", event);
                return;
            }
        };

        let mut added = 0;
        for value in items {
            match serde_json::from_value::<MenuItem>(value) {
                Ok(item) => {
                    menu.add(item);
                    added += 1;
                }
                Err(e) => warn!("⚠️ Ignoring malformed {} menu item: {}", menu.kind(), e),
            }
        }
        info!("🧭 Collected {} {} menu item(s) from plugins", added, menu.kind());
    }

    // Plugins

    pub fn load_plugin(&mut self, factory: &dyn PluginFactory) -> Result<PluginName, PluginSystemError> {
        self.plugins.load_plugin_from_factory(factory)
    }

    pub fn load_plugin_instance(&mut self, plugin: Box<dyn Plugin>) -> Result<PluginName, PluginSystemError> {
        self.plugins.load_plugin(plugin)
    }

    pub fn shutdown(&mut self) {
        self.plugins.shutdown();
    }
}
