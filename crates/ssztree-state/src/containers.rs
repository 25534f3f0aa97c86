// crates/ssztree-state/src/containers.rs

//! The beacon-state container family (reduced preset, two forks).
//!
//! Field order is consensus wire order. Altair appends the participation
//! lists and `inactivity_scores` after the phase0 fields, which keeps
//! every shared field at the same index across forks — the migration
//! loader relies on that for cross-fork seed reuse.

use ssztree_schema::{BasicList, BasicVector, Bitvector, ByteVector, CompositeList, CompositeVector};
use ssztree_view::{ssz_container, ContainerView};

/// Slots covered by the block/state root history vectors.
pub const SLOTS_PER_HISTORICAL_ROOT: usize = 64;

/// Epochs covered by the randao mix history vector.
pub const EPOCHS_PER_HISTORICAL_VECTOR: usize = 64;

/// Epochs covered by the slashings vector.
pub const EPOCHS_PER_SLASHINGS_VECTOR: usize = 64;

/// Bits in the justification bitvector.
pub const JUSTIFICATION_BITS_LENGTH: usize = 4;

/// Hard cap of the validator registry (and its parallel lists).
pub const VALIDATOR_REGISTRY_LIMIT: usize = 1 << 40;

/// Serialized size of one [`Validator`] record.
pub const VALIDATOR_WIRE_SIZE: usize = 121;

/// Byte range of the pubkey inside a serialized validator.
pub const VALIDATOR_PUBKEY_RANGE: std::ops::Range<usize> = 0..48;

/// Byte range of the withdrawal credentials inside a serialized validator.
pub const VALIDATOR_WITHDRAWAL_RANGE: std::ops::Range<usize> = 48..80;

ssz_container! {
    module fork_fields;
    /// Fork versioning data.
    pub struct Fork {
        pub previous_version: ByteVector<4> => PreviousVersion,
        pub current_version: ByteVector<4> => CurrentVersion,
        pub epoch: u64 => Epoch,
    }
}

ssz_container! {
    module checkpoint_fields;
    /// Finality checkpoint.
    pub struct Checkpoint {
        pub epoch: u64 => Epoch,
        pub root: ByteVector<32> => Root,
    }
}

ssz_container! {
    module header_fields;
    /// Block header as embedded in the state.
    pub struct BeaconBlockHeader {
        pub slot: u64 => Slot,
        pub proposer_index: u64 => ProposerIndex,
        pub parent_root: ByteVector<32> => ParentRoot,
        pub state_root: ByteVector<32> => StateRoot,
        pub body_root: ByteVector<32> => BodyRoot,
    }
}

ssz_container! {
    module validator_fields;
    /// Validator registry entry. Fixed 121-byte wire size; the pubkey and
    /// withdrawal credentials occupy bytes 0..48 and 48..80.
    pub struct Validator {
        pub pubkey: ByteVector<48> => Pubkey,
        pub withdrawal_credentials: ByteVector<32> => WithdrawalCredentials,
        pub effective_balance: u64 => EffectiveBalance,
        pub slashed: bool => Slashed,
        pub activation_eligibility_epoch: u64 => ActivationEligibilityEpoch,
        pub activation_epoch: u64 => ActivationEpoch,
        pub exit_epoch: u64 => ExitEpoch,
        pub withdrawable_epoch: u64 => WithdrawableEpoch,
    }
}

/// The validator registry list type shared by both forks.
pub type ValidatorRegistry = CompositeList<Validator, VALIDATOR_REGISTRY_LIMIT>;

ssz_container! {
    module phase0_fields;
    /// Phase0 beacon state (reduced preset).
    pub struct BeaconStatePhase0 {
        pub genesis_time: u64 => GenesisTime,
        pub genesis_validators_root: ByteVector<32> => GenesisValidatorsRoot,
        pub slot: u64 => Slot,
        pub fork: Fork => ForkInfo,
        pub latest_block_header: BeaconBlockHeader => LatestBlockHeader,
        pub block_roots: CompositeVector<ByteVector<32>, SLOTS_PER_HISTORICAL_ROOT> => BlockRoots,
        pub state_roots: CompositeVector<ByteVector<32>, SLOTS_PER_HISTORICAL_ROOT> => StateRoots,
        pub eth1_deposit_index: u64 => Eth1DepositIndex,
        pub validators: ValidatorRegistry => Validators,
        pub balances: BasicList<u64, VALIDATOR_REGISTRY_LIMIT> => Balances,
        pub randao_mixes: CompositeVector<ByteVector<32>, EPOCHS_PER_HISTORICAL_VECTOR> => RandaoMixes,
        pub slashings: BasicVector<u64, EPOCHS_PER_SLASHINGS_VECTOR> => Slashings,
        pub justification_bits: Bitvector<JUSTIFICATION_BITS_LENGTH> => JustificationBits,
        pub previous_justified_checkpoint: Checkpoint => PreviousJustifiedCheckpoint,
        pub current_justified_checkpoint: Checkpoint => CurrentJustifiedCheckpoint,
        pub finalized_checkpoint: Checkpoint => FinalizedCheckpoint,
    }
}

ssz_container! {
    module altair_fields;
    /// Altair beacon state: phase0 plus participation and inactivity
    /// tracking.
    pub struct BeaconStateAltair {
        pub genesis_time: u64 => GenesisTime,
        pub genesis_validators_root: ByteVector<32> => GenesisValidatorsRoot,
        pub slot: u64 => Slot,
        pub fork: Fork => ForkInfo,
        pub latest_block_header: BeaconBlockHeader => LatestBlockHeader,
        pub block_roots: CompositeVector<ByteVector<32>, SLOTS_PER_HISTORICAL_ROOT> => BlockRoots,
        pub state_roots: CompositeVector<ByteVector<32>, SLOTS_PER_HISTORICAL_ROOT> => StateRoots,
        pub eth1_deposit_index: u64 => Eth1DepositIndex,
        pub validators: ValidatorRegistry => Validators,
        pub balances: BasicList<u64, VALIDATOR_REGISTRY_LIMIT> => Balances,
        pub randao_mixes: CompositeVector<ByteVector<32>, EPOCHS_PER_HISTORICAL_VECTOR> => RandaoMixes,
        pub slashings: BasicVector<u64, EPOCHS_PER_SLASHINGS_VECTOR> => Slashings,
        pub justification_bits: Bitvector<JUSTIFICATION_BITS_LENGTH> => JustificationBits,
        pub previous_justified_checkpoint: Checkpoint => PreviousJustifiedCheckpoint,
        pub current_justified_checkpoint: Checkpoint => CurrentJustifiedCheckpoint,
        pub finalized_checkpoint: Checkpoint => FinalizedCheckpoint,
        pub previous_epoch_participation: BasicList<u8, VALIDATOR_REGISTRY_LIMIT> => PreviousEpochParticipation,
        pub current_epoch_participation: BasicList<u8, VALIDATOR_REGISTRY_LIMIT> => CurrentEpochParticipation,
        pub inactivity_scores: BasicList<u64, VALIDATOR_REGISTRY_LIMIT> => InactivityScores,
    }
}

/// Typed phase0 state view.
pub type BeaconStatePhase0View = ContainerView<BeaconStatePhase0>;

/// Typed altair state view.
pub type BeaconStateAltairView = ContainerView<BeaconStateAltair>;

#[cfg(test)]
mod tests {
    use super::*;
    use ssztree_schema::{ContainerSchema, SszType};

    #[test]
    fn validator_wire_size_is_fixed() {
        assert_eq!(Validator::FIXED_SIZE, Some(VALIDATOR_WIRE_SIZE));
        assert_eq!(Validator::CHUNK_DEPTH, 3);
        let v = Validator::default();
        assert_eq!(v.serialize().unwrap().len(), VALIDATOR_WIRE_SIZE);
    }

    #[test]
    fn state_chunk_geometry() {
        assert_eq!(BeaconStatePhase0::FIELD_COUNT, 16);
        assert_eq!(BeaconStatePhase0::CHUNK_DEPTH, 4);
        assert_eq!(BeaconStateAltair::FIELD_COUNT, 19);
        assert_eq!(BeaconStateAltair::CHUNK_DEPTH, 5);
        // Validators sit at the same field index in both forks.
        assert_eq!(
            <phase0_fields::Validators as ssztree_view::FieldOf<BeaconStatePhase0>>::INDEX,
            <altair_fields::Validators as ssztree_view::FieldOf<BeaconStateAltair>>::INDEX
        );
    }

    #[test]
    fn validator_roundtrip() {
        let v = Validator {
            pubkey: ByteVector::from_bytes(&[7u8; 48]).unwrap(),
            withdrawal_credentials: ByteVector::from_bytes(&[9u8; 32]).unwrap(),
            effective_balance: 32_000_000_000,
            slashed: true,
            activation_eligibility_epoch: 1,
            activation_epoch: 2,
            exit_epoch: u64::MAX,
            withdrawable_epoch: u64::MAX,
        };
        let bytes = v.serialize().unwrap();
        assert_eq!(&bytes[VALIDATOR_PUBKEY_RANGE], &[7u8; 48][..]);
        assert_eq!(&bytes[VALIDATOR_WITHDRAWAL_RANGE], &[9u8; 32][..]);
        assert_eq!(Validator::deserialize(&bytes).unwrap(), v);
    }

    #[test]
    fn state_value_roundtrip() {
        let state = BeaconStateAltair::default();
        let bytes = state.serialize().unwrap();
        assert_eq!(BeaconStateAltair::deserialize(&bytes).unwrap(), state);
    }
}
