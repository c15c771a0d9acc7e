//! SkillRuntime - 선택 → 컴파일 → 실행 파사드
//!
//! ```text
//! run(input)
//!   ├─ match_skills(input)        SkillSelector   (실패 시 빈 결과)
//!   └─ execute_skill(name, input)
//!        ├─ catalog.read_skill_body
//!        ├─ ProcessCompiler::compile  (매 실행마다 새로, 캐시 없음)
//!        ├─ engine.compile
//!        └─ ExecutionInstance::spawn  → InstanceHandle
//! ```

use crate::compiler::ProcessCompiler;
use crate::environment::VariableEnvironment;
use crate::instance::{ExecutionInstance, InstanceHandle, InstanceSpec};
use crate::resolver::{LlmResolver, RemoteToolResolver, ResolverSet};
use crate::selector::SkillSelector;
use skillflow_core::{DirectoryCatalog, McpToolInvoker, RemoteToolInvoker, SkillCatalog};
use skillflow_foundation::{Error, Result, SkillflowConfig};
use skillflow_provider::{CompletionClient, OpenAiCompatClient};
use skillflow_task::{ProcessEngine, SequentialEngine};
use std::sync::Arc;
use tracing::{info, warn};

/// Entry point for hosts
pub struct SkillRuntime {
    catalog: Arc<dyn SkillCatalog>,
    engine: Arc<dyn ProcessEngine>,
    selector: SkillSelector,
    compiler: ProcessCompiler,
    resolvers: ResolverSet,
    config: SkillflowConfig,
}

impl SkillRuntime {
    pub fn builder() -> SkillRuntimeBuilder {
        SkillRuntimeBuilder::default()
    }

    /// Directory catalog, OpenAI-compatible client, MCP invoker and the
    /// sequential engine, all from `config`
    pub fn from_config(config: SkillflowConfig) -> Result<Self> {
        let client = OpenAiCompatClient::from_settings(&config.provider)?;
        Self::builder()
            .catalog(Arc::new(DirectoryCatalog::from_config(&config)))
            .client(Arc::new(client))
            .invoker(Arc::new(McpToolInvoker::new()?))
            .config(config)
            .build()
    }

    pub fn config(&self) -> &SkillflowConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<dyn SkillCatalog> {
        &self.catalog
    }

    /// Skill names fitting `input` (zero or one)
    pub async fn match_skills(&self, input: &str) -> Vec<String> {
        let skills = match self.catalog.list_skills().await {
            Ok(skills) => skills,
            Err(e) => {
                warn!("Catalog unavailable: {}", e);
                Vec::new()
            }
        };
        self.selector.select(input, &skills).await
    }

    /// Compile and start the named skill
    pub async fn execute_skill(&self, name: &str, input: &str) -> Result<InstanceHandle> {
        let skill = self
            .catalog
            .find_skill(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("skill '{}'", name)))?;

        let body = self.catalog.read_skill_body(&skill.location).await?;
        if body.trim().is_empty() {
            return Err(Error::NotFound(format!("skill '{}' has an empty body", name)));
        }

        let definition = self.compiler.compile(&body).await?;
        let process = self.engine.compile(&skill.name, &definition)?;
        info!(
            "Skill '{}' compiled by {} ({} activities)",
            skill.name,
            self.engine.name(),
            process.activities().len()
        );

        let spec = InstanceSpec {
            skill_name: skill.name,
            skill_body: Arc::from(body),
            environment: VariableEnvironment::with_user_input(input),
            resolvers: self.resolvers.clone(),
            completion_timeout: self.config.completion_timeout(),
        };
        Ok(ExecutionInstance::spawn(spec, process))
    }

    /// Select, then execute; `None` when no skill fits
    pub async fn run(&self, input: &str) -> Result<Option<InstanceHandle>> {
        match self.match_skills(input).await.into_iter().next() {
            Some(name) => self.execute_skill(&name, input).await.map(Some),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`SkillRuntime`]
#[derive(Default)]
pub struct SkillRuntimeBuilder {
    catalog: Option<Arc<dyn SkillCatalog>>,
    client: Option<Arc<dyn CompletionClient>>,
    engine: Option<Arc<dyn ProcessEngine>>,
    invoker: Option<Arc<dyn RemoteToolInvoker>>,
    config: Option<SkillflowConfig>,
}

impl SkillRuntimeBuilder {
    pub fn catalog(mut self, catalog: Arc<dyn SkillCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Defaults to [`SequentialEngine`]
    pub fn engine(mut self, engine: Arc<dyn ProcessEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn invoker(mut self, invoker: Arc<dyn RemoteToolInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    pub fn config(mut self, config: SkillflowConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<SkillRuntime> {
        let catalog = self
            .catalog
            .ok_or_else(|| Error::Config("skill catalog is required".to_string()))?;
        let client = self
            .client
            .ok_or_else(|| Error::Config("completion client is required".to_string()))?;
        let invoker = self
            .invoker
            .ok_or_else(|| Error::Config("remote tool invoker is required".to_string()))?;
        let engine = self
            .engine
            .unwrap_or_else(|| Arc::new(SequentialEngine::new()) as Arc<dyn ProcessEngine>);
        let config = self.config.unwrap_or_default();

        let timeout = config.completion_timeout();
        let temps = &config.temperatures;

        let resolvers = ResolverSet::new(
            Arc::new(LlmResolver::new(client.clone(), temps.llm_task)),
            Arc::new(RemoteToolResolver::new(
                client.clone(),
                invoker,
                temps.remote_tool_analysis,
                config.remote_tool_timeout(),
            )),
        );

        let selector = SkillSelector::new(client.clone(), temps.selection, timeout);
        let compiler = ProcessCompiler::new(client, temps.compile, timeout);

        Ok(SkillRuntime {
            catalog,
            engine,
            selector,
            compiler,
            resolvers,
            config,
        })
    }
}
