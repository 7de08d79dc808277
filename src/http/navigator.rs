//! Where the front-end currently is, and how to send it back to login.

use std::sync::{Mutex, PoisonError};

use strum::{Display, EnumString};

/// Views the front-end can be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Route {
    Login,
    CompleteRegistration,
    Dashboard,
}

/// Navigation seam between the client and whatever renders the session.
pub trait Navigator: Send + Sync {
    fn current(&self) -> Route;
    fn navigate(&self, route: Route);

    /// Go to the login view unless already there. Returns whether a redirect happened.
    ///
    /// Concurrent failures after a refresh has failed all end up here; only the
    /// first one moves the front-end.
    fn redirect_to_login(&self) -> bool {
        if self.current() == Route::Login {
            return false;
        }
        self.navigate(Route::Login);
        true
    }
}

/// In-process navigator recording every transition.
#[derive(Debug)]
pub struct MemoryNavigator {
    state: Mutex<NavState>,
}

#[derive(Debug)]
struct NavState {
    current: Route,
    history: Vec<Route>,
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(Route::Dashboard)
    }
}

impl MemoryNavigator {
    pub fn new(initial: Route) -> Self {
        Self {
            state: Mutex::new(NavState {
                current: initial,
                history: Vec::new(),
            }),
        }
    }

    /// Transitions made so far, oldest first.
    pub fn history(&self) -> Vec<Route> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .clone()
    }

    pub fn login_redirects(&self) -> usize {
        self.history()
            .iter()
            .filter(|route| **route == Route::Login)
            .count()
    }
}

impl Navigator for MemoryNavigator {
    fn current(&self) -> Route {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
    }

    fn navigate(&self, route: Route) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.current = route;
        state.history.push(route);
    }

    // Check and move under one lock so racing failures cannot both redirect.
    fn redirect_to_login(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.current == Route::Login {
            return false;
        }
        state.current = Route::Login;
        state.history.push(Route::Login);
        true
    }
}
