use crate::error::AgentError;

use include_dir::{Dir, include_dir};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static AGENT_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets/agents");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub avatar: String,
    #[serde(default)]
    pub call: Option<CallConfig>,
    pub background: Background,
    pub personality: Personality,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallConfig {
    #[serde(default)]
    pub pathway_id: Option<String>,
    // Environment variable that holds the pathway id when it is not baked in.
    #[serde(default)]
    pub pathway_env: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub history: Vec<String>,
    pub beliefs: Vec<String>,
    pub goals: Vec<String>,
    pub fears: Vec<String>,
    pub relationships: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub tone: String,
    pub traits: Vec<String>,
    pub catchphrases: Vec<String>,
    pub speech_patterns: Vec<String>,
    pub triggers: Vec<String>,
    pub mannerisms: Vec<String>,
}

impl Agent {
    pub fn pathway_id(&self) -> Option<&str> {
        self.call
            .as_ref()
            .and_then(|call| call.pathway_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn voice(&self) -> Option<&str> {
        self.call.as_ref().and_then(|call| call.voice.as_deref())
    }

    pub fn can_call(&self) -> bool {
        self.call.is_some()
    }
}

/// Immutable persona catalogue, sorted by display name.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
}

impl AgentRegistry {
    /// Loads the persona definitions embedded at build time.
    pub fn embedded() -> Result<Self, AgentError> {
        let sources = AGENT_ASSETS
            .files()
            .filter(|file| file.path().extension().is_some_and(|ext| ext == "json"))
            .map(|file| {
                (
                    file.path().display().to_string(),
                    file.contents_utf8().unwrap_or_default(),
                )
            });
        Self::from_sources(sources)
    }

    pub fn from_sources<'a, I>(sources: I) -> Result<Self, AgentError>
    where
        I: IntoIterator<Item = (String, &'a str)>,
    {
        let mut agents = Vec::new();
        for (path, json) in sources {
            let agent: Agent = serde_json::from_str(json)
                .map_err(|source| AgentError::InvalidDefinition { path, source })?;
            agents.push(agent);
        }
        Self::from_agents(agents)
    }

    pub fn from_agents(mut agents: Vec<Agent>) -> Result<Self, AgentError> {
        if agents.is_empty() {
            return Err(AgentError::Empty);
        }

        let mut seen = HashSet::new();
        for agent in &agents {
            if !seen.insert(agent.id.clone()) {
                return Err(AgentError::DuplicateId(agent.id.clone()));
            }
        }

        agents.sort_by(|a, b| a.name.cmp(&b.name));
        log::debug!("Agent registry loaded with {} personas", agents.len());
        Ok(Self { agents })
    }

    // Fills pathway ids from the environment for agents that name a variable.
    pub fn with_pathways<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for agent in &mut self.agents {
            if let Some(call) = agent.call.as_mut() {
                if call.pathway_id.as_deref().is_none_or(str::is_empty) {
                    if let Some(var) = call.pathway_env.as_deref() {
                        call.pathway_id = lookup(var).filter(|id| !id.trim().is_empty());
                    }
                }
            }
        }
        self
    }

    pub fn all(&self) -> &[Agent] {
        &self.agents
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
