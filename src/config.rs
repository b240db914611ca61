/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2023 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{ConsensusError, Result};

/// Which consensus mechanism variant the node runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsensusMechanismKind {
    ProofOfSignature,
    ProofOfStake,
}

impl ConsensusMechanismKind {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "PROOF_OF_SIGNATURE" => Ok(Self::ProofOfSignature),
            "PROOF_OF_STAKE" => Ok(Self::ProofOfStake),
            _ => Err(ConsensusError::InvalidConfig("CODA_CONSENSUS_MECHANISM".into())),
        }
    }
}

/// Stake-variant-only parameters (spec.md section 4.4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeParameters {
    pub slot_interval: Duration,
    pub unforkable_transition_count: u64,
    pub probable_slots_per_transition_count: u64,
    pub expected_network_delay: Duration,
    pub approximate_network_diameter: u64,
    pub genesis_state_timestamp: DateTime<Utc>,
    pub coinbase: u64,
}

impl StakeParameters {
    /// Number of slots in one epoch.
    pub fn epoch_len_slots(&self) -> u64 {
        self.probable_slots_per_transition_count * self.unforkable_transition_count
    }
}

/// Top-level configuration, built once at startup from the `CODA_*`
/// environment variables named in spec.md section 6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mechanism: ConsensusMechanismKind,
    pub proposal_interval: Duration,
    pub stake: Option<StakeParameters>,
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| ConsensusError::InvalidConfig(name.to_string()))
}

fn parse_u64(name: &str) -> Result<u64> {
    env_var(name)?.parse::<u64>().map_err(|_| ConsensusError::InvalidConfig(name.to_string()))
}

fn parse_millis(name: &str) -> Result<Duration> {
    Ok(Duration::from_millis(parse_u64(name)?))
}

impl Config {
    /// Reads and validates every `CODA_*` variable. Any unrecognized or
    /// malformed value fails with `ConsensusError::InvalidConfig` naming
    /// the offending variable, per spec.md section 6.
    pub fn from_env() -> Result<Self> {
        let mechanism = ConsensusMechanismKind::parse(&env_var("CODA_CONSENSUS_MECHANISM")?)?;
        let proposal_interval = parse_millis("CODA_PROPOSAL_INTERVAL")?;

        let stake = match mechanism {
            ConsensusMechanismKind::ProofOfSignature => None,
            ConsensusMechanismKind::ProofOfStake => {
                let slot_interval = parse_millis("CODA_SLOT_INTERVAL")?;
                let unforkable_transition_count = parse_u64("CODA_UNFORKABLE_TRANSITION_COUNT")?;
                let probable_slots_per_transition_count =
                    parse_u64("CODA_PROBABLE_SLOTS_PER_TRANSITION_COUNT")?;
                let expected_network_delay = parse_millis("CODA_EXPECTED_NETWORK_DELAY")?;
                let approximate_network_diameter = parse_u64("CODA_APPROXIMATE_NETWORK_DIAMETER")?;

                let genesis_raw = env_var("CODA_GENESIS_STATE_TIMESTAMP")?;
                let genesis_state_timestamp = DateTime::parse_from_rfc3339(&genesis_raw)
                    .map_err(|_| ConsensusError::InvalidConfig("CODA_GENESIS_STATE_TIMESTAMP".into()))?
                    .with_timezone(&Utc);

                let coinbase = parse_u64("CODA_COINBASE")?;

                Some(StakeParameters {
                    slot_interval,
                    unforkable_transition_count,
                    probable_slots_per_transition_count,
                    expected_network_delay,
                    approximate_network_diameter,
                    genesis_state_timestamp,
                    coinbase,
                })
            }
        };

        Ok(Self { mechanism, proposal_interval, stake })
    }
}
