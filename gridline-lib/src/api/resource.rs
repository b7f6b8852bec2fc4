//! REST resources listed by the dashboard

use std::fmt;
use std::str::FromStr;

/// A list/CRUD endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Agents,
    Analyses,
    Users,
    Projects,
    TimeSessions,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Self::Agents,
        Self::Analyses,
        Self::Users,
        Self::Projects,
        Self::TimeSessions,
    ];

    /// Path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::Analyses => "analyses",
            Self::Users => "users",
            Self::Projects => "projects",
            Self::TimeSessions => "time-tracking/sessions",
        }
    }

    /// Name used for export files and storage ids.
    pub fn entity_name(&self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::Analyses => "analyses",
            Self::Users => "users",
            Self::Projects => "projects",
            Self::TimeSessions => "time-sessions",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity_name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "agents" | "ai-agents" => Ok(Self::Agents),
            "analyses" | "analysis" => Ok(Self::Analyses),
            "users" => Ok(Self::Users),
            "projects" => Ok(Self::Projects),
            "time-sessions" | "time-tracking" | "sessions" => Ok(Self::TimeSessions),
            other => Err(format!("unknown resource '{other}'")),
        }
    }
}
