//! Route and group composition
//!
//! Walks the configured groups and routes, resolves their handler
//! references against the loaded plugins and attaches the resulting chains
//! to the router tree. Groups are created at most once, on first use, so a
//! route may name a group that the group pass skipped.

use crate::config::api::{Config, HandlerRef, RouteDecl};
use crate::plugin::api::{PluginResult, Plugins, RequireFilter};
use crate::routing::error::{RoutingError, RoutingResult};
use crate::routing::handler::Handler;
use crate::routing::method::HttpMethod;
use crate::routing::tree::{RouterTree, ScopeId};
use std::collections::{HashMap, HashSet};

pub struct Composer<'a> {
    config: &'a Config,
    plugins: &'a dyn Plugins,
    filter: &'a RequireFilter,
    tree: &'a mut RouterTree,
    groups: HashMap<String, ScopeId>,
    in_progress: HashSet<String>,
}

impl<'a> Composer<'a> {
    pub fn new(
        config: &'a Config,
        plugins: &'a dyn Plugins,
        filter: &'a RequireFilter,
        tree: &'a mut RouterTree,
    ) -> Self {
        Self {
            config,
            plugins,
            filter,
            tree,
            groups: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Create every active group. The first failure aborts.
    pub fn init_groups(&mut self) -> RoutingResult<()> {
        let config = self.config;
        for group in &config.groups {
            if !self.filter.allows_group(&group.handlers) {
                log::debug!("Group \"{}\" not activated by require filter", group.name);
                continue;
            }
            self.ensure_group(&group.name)?;
        }
        Ok(())
    }

    /// Attach every active route.
    ///
    /// A failing route does not stop the others from being attached; all
    /// failures are reported together with their configuration index.
    pub fn init_routes(&mut self) -> RoutingResult<usize> {
        let config = self.config;
        let mut attached = 0;
        let mut errors = Vec::new();

        for (index, route) in config.routes.iter().enumerate() {
            if !self.filter.allows_route(&route.handlers) {
                log::debug!("Route #{} ({}) not activated by require filter", index, route);
                continue;
            }
            match self.init_route(route) {
                Ok(()) => attached += 1,
                Err(source) => errors.push(RoutingError::RouteInit {
                    index,
                    route: route.to_string(),
                    source: Box::new(source),
                }),
            }
        }

        RoutingError::from_list(errors)?;
        log::info!("Attached {} routes", attached);
        Ok(attached)
    }

    /// Scope of a group, creating it and its ancestors on first use
    pub fn ensure_group(&mut self, name: &str) -> RoutingResult<ScopeId> {
        if let Some(scope) = self.groups.get(name) {
            return Ok(*scope);
        }
        if !self.in_progress.insert(name.to_string()) {
            return Err(RoutingError::GroupCycle {
                name: name.to_string(),
            });
        }

        let result = self.create_group(name);
        self.in_progress.remove(name);
        let scope = result?;
        self.groups.insert(name.to_string(), scope);
        Ok(scope)
    }

    fn create_group(&mut self, name: &str) -> RoutingResult<ScopeId> {
        let config = self.config;
        let group = config
            .get_group(Some(name))
            .ok()
            .flatten()
            .ok_or_else(|| RoutingError::GroupNotFound {
                name: name.to_string(),
            })?;

        let handlers: Vec<HandlerRef> = group
            .handlers
            .iter()
            .filter(|h| self.filter.allows(h.plugin()))
            .cloned()
            .collect();
        let chain = self.resolve(&handlers).map_err(|e| RoutingError::GroupInit {
            name: name.to_string(),
            source: Box::new(e.into()),
        })?;

        let parent = match group.group.as_deref().filter(|p| !p.is_empty()) {
            Some(parent) => self.ensure_group(parent)?,
            None => self.tree.root(),
        };

        let scope = self.tree.group(parent, &group.path, chain);
        log::debug!("Group \"{}\" at {}", name, self.tree.prefix(scope));
        Ok(scope)
    }

    fn init_route(&mut self, route: &RouteDecl) -> RoutingResult<()> {
        let chain = self.resolve(&route.handlers)?;
        let scope = match route.group.as_deref().filter(|g| !g.is_empty()) {
            Some(group) => self.ensure_group(group)?,
            None => self.tree.root(),
        };
        let method = HttpMethod::from_config(route.method.as_deref());
        self.tree.handle(scope, method, &route.path, chain)
    }

    fn resolve(&self, handlers: &[HandlerRef]) -> PluginResult<Vec<Handler>> {
        handlers
            .iter()
            .map(|h| self.plugins.handler(h.plugin(), h.symbol()))
            .collect()
    }
}

/// Compose groups then routes into `tree`
pub fn compose(
    config: &Config,
    plugins: &dyn Plugins,
    filter: &RequireFilter,
    tree: &mut RouterTree,
) -> RoutingResult<usize> {
    let mut composer = Composer::new(config, plugins, filter, tree);
    composer.init_groups()?;
    composer.init_routes()
}
