fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config-tree maps become BTreeMaps so a decoded tree re-encodes
    // deterministically; all packages compile together so cross-package
    // imports resolve relatively.
    let mut config = prost_build::Config::new();
    config.btree_map(["."]);

    tonic_build::configure().compile_with_config(
        config,
        &[
            "proto/common.proto",
            "proto/peer.proto",
            "proto/orderer.proto",
        ],
        &["proto"],
    )?;

    Ok(())
}
