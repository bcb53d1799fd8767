use std::collections::BTreeMap;

use derive_where::derive_where;
use tracing::debug;

use crate::SideHandlers;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error("Side router is sealed, cannot add route '{0}'")]
    Sealed(String),

    #[error("Side router is already sealed")]
    AlreadySealed,

    #[error("Route '{0}' must be non-empty and alphanumeric")]
    InvalidRoute(String),

    #[error("Route '{0}' is already registered")]
    DuplicateRoute(String),

    #[error("No side handlers registered for route '{0}'")]
    UnknownRoute(String),
}

/// Registry of side and post handlers, keyed by message route.
///
/// Routes are registered while the application is wired, then the router is sealed and never
/// changes again. Misuse is a programming error: the panicking methods are meant for wiring
/// code, the `try_` variants for callers that want to handle it.
#[derive_where(Debug, Default)]
pub struct SideRouter<M> {
    routes: BTreeMap<String, SideHandlers<M>>,
    sealed: bool,
}

impl<M> SideRouter<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_add_route(
        &mut self,
        route: impl Into<String>,
        handlers: SideHandlers<M>,
    ) -> Result<&mut Self, RouterError> {
        let route = route.into();

        if self.sealed {
            return Err(RouterError::Sealed(route));
        }

        if !is_valid_route(&route) {
            return Err(RouterError::InvalidRoute(route));
        }

        if self.routes.contains_key(&route) {
            return Err(RouterError::DuplicateRoute(route));
        }

        debug!(%route, "Registered side route");
        self.routes.insert(route, handlers);

        Ok(self)
    }

    /// Registers the handlers for `route`.
    ///
    /// # Panics
    /// If the router is sealed, the route is not alphanumeric, or the route is already registered.
    #[allow(clippy::panic)]
    pub fn add_route(&mut self, route: impl Into<String>, handlers: SideHandlers<M>) -> &mut Self {
        match self.try_add_route(route, handlers) {
            Ok(router) => router,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn has_route(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }

    pub fn get_route(&self, route: &str) -> Option<&SideHandlers<M>> {
        self.routes.get(route)
    }

    /// # Panics
    /// If no handlers are registered for `route`.
    #[allow(clippy::panic)]
    pub fn route(&self, route: &str) -> &SideHandlers<M> {
        match self.get_route(route) {
            Some(handlers) => handlers,
            None => panic!("{}", RouterError::UnknownRoute(route.to_string())),
        }
    }

    pub fn try_seal(&mut self) -> Result<(), RouterError> {
        if self.sealed {
            return Err(RouterError::AlreadySealed);
        }

        self.sealed = true;
        Ok(())
    }

    /// # Panics
    /// If the router is already sealed.
    #[allow(clippy::panic)]
    pub fn seal(&mut self) {
        if let Err(e) = self.try_seal() {
            panic!("{e}");
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

fn is_valid_route(route: &str) -> bool {
    !route.is_empty() && route.chars().all(|c| c.is_ascii_alphanumeric())
}
