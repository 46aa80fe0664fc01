//! Flag words stored alongside clusters, attributes and commands.

use bitflags::bitflags;
use matter_data_model::{ClusterFunction, Side};

bitflags! {
    /// Per-attribute metadata flags.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
    pub struct AttributeMask: u16 {
        const MIN_MAX = 0x0001;
        const TOKENIZE = 0x0002;
        const WRITABLE = 0x0008;
        const EXTERNAL_STORAGE = 0x0010;
        const SINGLETON = 0x0020;
        const NULLABLE = 0x0040;
        const MUST_USE_TIMED_WRITE = 0x0080;
        const MANUFACTURER_SPECIFIC = 0x0100;
    }
}

bitflags! {
    /// Side of a cluster instance and the callbacks it wants invoked.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
    pub struct ClusterMask: u8 {
        const INIT_FUNCTION = 0x01;
        const ATTRIBUTE_CHANGED_FUNCTION = 0x02;
        const SHUTDOWN_FUNCTION = 0x10;
        const PRE_ATTRIBUTE_CHANGED_FUNCTION = 0x20;
        const SERVER = 0x40;
        const CLIENT = 0x80;
    }
}

bitflags! {
    /// Direction of a command relative to the cluster instance.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
    pub struct CommandMask: u8 {
        const INCOMING_SERVER = 0x01;
        const INCOMING_CLIENT = 0x02;
        const OUTGOING_SERVER = 0x04;
        const OUTGOING_CLIENT = 0x08;
        const MANUFACTURER_SPECIFIC = 0x10;
    }
}

/// Cluster codes from here on are manufacturer specific clusters.
pub const MANUFACTURER_SPECIFIC_CLUSTER_START: u16 = 0xFC00;

impl ClusterMask {
    pub fn for_cluster(side: Side, functions: &[ClusterFunction]) -> Self {
        let mut mask = match side {
            Side::Server => ClusterMask::SERVER,
            Side::Client => ClusterMask::CLIENT,
        };
        for function in functions {
            mask |= match function {
                ClusterFunction::Init => ClusterMask::INIT_FUNCTION,
                ClusterFunction::AttributeChanged => ClusterMask::ATTRIBUTE_CHANGED_FUNCTION,
                ClusterFunction::Shutdown => ClusterMask::SHUTDOWN_FUNCTION,
                ClusterFunction::PreAttributeChanged => ClusterMask::PRE_ATTRIBUTE_CHANGED_FUNCTION,
            };
        }
        mask
    }
}

impl CommandMask {
    /// Direction bits of a command sent by `source`, on a cluster instance
    /// of side `cluster_side`.
    ///
    /// A command is incoming only when it comes from the other side and
    /// outgoing only when it comes from the same side, whatever the
    /// `incoming`/`outgoing` flags claim.
    pub fn for_command(
        source: Side,
        cluster_side: Side,
        incoming: bool,
        outgoing: bool,
        manufacturer_specific: bool,
    ) -> Self {
        let mut mask = CommandMask::empty();
        let same_side = source == cluster_side;
        match source {
            Side::Client => {
                mask.set(CommandMask::INCOMING_SERVER, incoming && !same_side);
                mask.set(CommandMask::OUTGOING_CLIENT, outgoing && same_side);
            }
            Side::Server => {
                mask.set(CommandMask::INCOMING_CLIENT, incoming && !same_side);
                mask.set(CommandMask::OUTGOING_SERVER, outgoing && same_side);
            }
        }
        if manufacturer_specific && !mask.is_empty() {
            mask |= CommandMask::MANUFACTURER_SPECIFIC;
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Side::Client, Side::Server, true, true, CommandMask::INCOMING_SERVER)]
    #[case(Side::Client, Side::Server, false, true, CommandMask::empty())]
    #[case(Side::Server, Side::Server, true, true, CommandMask::OUTGOING_SERVER)]
    #[case(Side::Server, Side::Server, true, false, CommandMask::empty())]
    #[case(Side::Server, Side::Client, true, false, CommandMask::INCOMING_CLIENT)]
    #[case(Side::Client, Side::Client, true, true, CommandMask::OUTGOING_CLIENT)]
    fn command_direction(
        #[case] source: Side,
        #[case] cluster_side: Side,
        #[case] incoming: bool,
        #[case] outgoing: bool,
        #[case] expected: CommandMask,
    ) {
        assert_eq!(
            CommandMask::for_command(source, cluster_side, incoming, outgoing, false),
            expected
        );
    }

    #[test]
    fn manufacturer_bit_needs_a_direction() {
        assert_eq!(
            CommandMask::for_command(Side::Client, Side::Server, true, false, true),
            CommandMask::INCOMING_SERVER | CommandMask::MANUFACTURER_SPECIFIC
        );
        assert!(CommandMask::for_command(Side::Client, Side::Server, false, false, true).is_empty());
    }

    #[test]
    fn cluster_functions() {
        let mask = ClusterMask::for_cluster(
            Side::Server,
            &[ClusterFunction::Init, ClusterFunction::Shutdown],
        );
        assert_eq!(
            mask.bits(),
            0x40 | 0x01 | 0x10
        );
        assert_eq!(ClusterMask::for_cluster(Side::Client, &[]), ClusterMask::CLIENT);
    }
}
