use std::collections::HashMap;

use log::info;

use clusterterm_types::{SessionError, Target, TargetKind};

use super::bridge::SessionBridge;
use super::emulator::TerminalEmulator;
use super::endpoint::TerminalEndpoint;
use super::resize::HostSurface;
use super::transport::Connector;
use super::MAX_CONCURRENT_SESSIONS;

/// Sessions opened from one UI shell, at most one live session per target
pub struct SessionRegistry {
    sessions: HashMap<(TargetKind, String), SessionBridge>,
    max_sessions: usize,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("max_sessions", &self.max_sessions)
            .finish()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(MAX_CONCURRENT_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            max_sessions,
        }
    }

    /// Open a session for `target`.
    ///
    /// Fails with `TargetBusy` while a live session for the same target
    /// exists. A finished session for the target is released and replaced.
    /// On failure the emulator is disposed before returning.
    pub fn open(
        &mut self,
        target: Target,
        endpoint: TerminalEndpoint,
        connector: &mut dyn Connector,
        mut emulator: Box<dyn TerminalEmulator>,
        surface: &mut dyn HostSurface,
    ) -> Result<&mut SessionBridge, SessionError> {
        let key = target.key();
        if self.sessions.get(&key).is_some_and(|s| !s.is_finished()) {
            emulator.dispose();
            return Err(SessionError::TargetBusy(target.label()));
        }
        if let Some(mut finished) = self.sessions.remove(&key) {
            info!("Replacing finished session for {}", target);
            finished.close();
        }

        if self.is_full() {
            self.prune();
        }
        if self.is_full() {
            emulator.dispose();
            return Err(SessionError::TooManySessions(self.max_sessions));
        }

        let bridge = SessionBridge::open(target, endpoint, connector, emulator, surface)?;
        Ok(self.sessions.entry(key).or_insert(bridge))
    }

    pub fn get(&self, target: &Target) -> Option<&SessionBridge> {
        self.sessions.get(&target.key())
    }

    pub fn get_mut(&mut self, target: &Target) -> Option<&mut SessionBridge> {
        self.sessions.get_mut(&target.key())
    }

    /// Close and forget the session for `target`. Returns false if none existed.
    pub fn close(&mut self, target: &Target) -> bool {
        match self.sessions.remove(&target.key()) {
            Some(mut session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    /// Release sessions whose connection has finished and return their
    /// targets, so hosts can drop whatever they keep per session.
    pub fn prune(&mut self) -> Vec<Target> {
        let mut released = Vec::new();
        self.sessions.retain(|_, session| {
            if session.is_finished() || session.is_closed() {
                session.close();
                released.push(session.target().clone());
                false
            } else {
                true
            }
        });
        released
    }

    /// The next `open` of a new target would have to prune first
    pub fn is_full(&self) -> bool {
        self.sessions.len() >= self.max_sessions
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn close_all(&mut self) {
        for (_, mut session) in self.sessions.drain() {
            session.close();
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        self.close_all();
    }
}
