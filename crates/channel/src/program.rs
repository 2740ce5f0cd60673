//! Program lifecycle: install, instantiate, invoke, query.

use std::collections::BTreeMap;

use tracing::info;
use weft_client::proposal::{deploy_proposal, install_proposal};
use weft_proto::peer::{DeploymentSpec, ProgramId, ProgramInput, ProgramSpec};
use weft_types::error::OrchestrationError;
use weft_types::identity::SigningIdentity;
use weft_types::Endpoint;

use crate::org::OrgContext;

/// Operations on one deployed (or deployable) program, performed as one
/// organization.
pub struct Program {
    name: String,
    version: String,
    path: String,
    org: OrgContext,
}

impl Program {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<String>,
        org: OrgContext,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            path: path.into(),
            org,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn creator(&self) -> Vec<u8> {
        self.org.client.signer().serialize()
    }

    fn program_id(&self) -> ProgramId {
        ProgramId {
            path: self.path.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }

    /// Installs the packaged program bytes on one of `peers`
    /// (first-success). Installs touch no shared ledger state, so there is
    /// nothing to order or watch.
    pub async fn install(
        &self,
        package: Vec<u8>,
        peers: &[Endpoint],
    ) -> Result<(), OrchestrationError> {
        let deployment = DeploymentSpec {
            spec: Some(ProgramSpec {
                program_id: Some(self.program_id()),
                input: None,
            }),
            code_package: package,
            ..Default::default()
        };
        let built = install_proposal(&deployment, &self.creator())?;
        self.org.client.endorse_proposal(built, peers).await?;
        info!(program = %self.name, version = %self.version, "program installed");
        Ok(())
    }

    /// Instantiates the program on `channel_id` with the given constructor
    /// arguments. The endorsement policy expression and private-collection
    /// configuration pass through uninterpreted.
    pub async fn instantiate(
        &self,
        channel_id: &str,
        args: Vec<Vec<u8>>,
        policy: Option<String>,
        collections: Option<Vec<u8>>,
        endorsers: &[Endpoint],
        orderers: &[Endpoint],
    ) -> Result<(), OrchestrationError> {
        let deployment = DeploymentSpec {
            spec: Some(ProgramSpec {
                program_id: Some(self.program_id()),
                input: Some(ProgramInput { args }),
            }),
            code_package: Vec::new(),
            endorsement_policy: policy.unwrap_or_default(),
            collection_config: collections.unwrap_or_default(),
        };
        let built = deploy_proposal(channel_id, &deployment, &self.creator())?;
        let endorsed = self.org.client.endorse_proposal(built, endorsers).await?;
        self.org.client.submit(&endorsed, orderers).await?;
        info!(program = %self.name, channel = channel_id, "program instantiation submitted");
        Ok(())
    }

    /// Invokes the program and confirms the commit: mismatch-free quorum
    /// endorsement over `peers`, broadcast with orderer failover, then a
    /// commit watch against the endorsing peer. A commit-watch timeout or
    /// an invalid validation outcome fails the invocation even though the
    /// broadcast was accepted.
    pub async fn invoke(
        &self,
        channel_id: &str,
        args: Vec<Vec<u8>>,
        peers: &[Endpoint],
        orderers: &[Endpoint],
    ) -> Result<String, OrchestrationError> {
        let endorsed = self
            .org
            .client
            .endorse_all(channel_id, &self.name, args, BTreeMap::new(), peers)
            .await?;
        self.org.client.submit(&endorsed, orderers).await?;

        let valid = self
            .org
            .client
            .wait_for_commit(channel_id, &endorsed.tx_id, &endorsed.endorser, None)
            .await?;
        if !valid {
            return Err(OrchestrationError::InvalidTransaction(endorsed.tx_id));
        }
        info!(program = %self.name, tx_id = %endorsed.tx_id, "invocation committed");
        Ok(endorsed.tx_id)
    }

    /// Executes the program on one peer (first-success) and returns the
    /// result payload without ordering anything.
    pub async fn query(
        &self,
        channel_id: &str,
        args: Vec<Vec<u8>>,
        peers: &[Endpoint],
    ) -> Result<Vec<u8>, OrchestrationError> {
        let endorsed = self
            .org
            .client
            .endorse(channel_id, &self.name, args, BTreeMap::new(), peers)
            .await?;
        Ok(endorsed
            .responses
            .first()
            .and_then(|r| r.response.as_ref())
            .map(|r| r.payload.clone())
            .unwrap_or_default())
    }
}
