//! # Cluster Subcommands
//!
//! Topology inspection and volume administration on the master, plus the
//! status of a single volume server.

use anyhow::{Context, Result};
use clap::Args;

use weedo_client::{ClusterStatus, GrowRequest, WeedClient};

/// Arguments for `weedo status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Show this volume server's status instead of the cluster's.
    #[arg(long, value_name = "ADDRESS")]
    pub volume: Option<String>,
}

/// Arguments for `weedo grow`.
#[derive(Args, Debug)]
pub struct GrowArgs {
    /// Number of volumes to pre-allocate.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: u32,
    #[arg(long)]
    pub collection: Option<String>,
    #[arg(long)]
    pub replication: Option<String>,
    #[arg(long)]
    pub data_center: Option<String>,
}

/// Arguments for `weedo vacuum`.
#[derive(Args, Debug)]
pub struct VacuumArgs {
    /// Garbage ratio above which a volume is compacted (0.0 to 1.0).
    #[arg(long)]
    pub threshold: Option<f64>,
}

/// Print the cluster topology or a volume server's volumes.
pub async fn run_status(args: &StatusArgs, client: &WeedClient) -> Result<u8> {
    match &args.volume {
        Some(address) => {
            let status = client
                .volume_at(address, address)
                .status()
                .await
                .with_context(|| format!("status of {address} failed"))?;
            println!("version {}", status.version);
            for v in &status.volumes {
                println!(
                    "volume {}\t{}\tfiles={} deleted={} size={}{}",
                    v.id,
                    if v.collection.is_empty() { "-" } else { v.collection.as_str() },
                    v.file_count,
                    v.delete_count,
                    v.size,
                    if v.read_only { " read-only" } else { "" }
                );
            }
        }
        None => {
            let status = client
                .master()
                .status()
                .await
                .context("cluster status failed")?;
            print!("{}", render_cluster(&status));
        }
    }
    Ok(0)
}

fn render_cluster(status: &ClusterStatus) -> String {
    let topo = &status.topology;
    let mut out = format!(
        "version {}\nvolumes free={} max={}\n",
        status.version, topo.free, topo.max
    );
    for dc in &topo.data_centers {
        out.push_str(&format!("{}\n", dc.id));
        for rack in &dc.racks {
            out.push_str(&format!("  {}\n", rack.id));
            for node in &rack.data_nodes {
                out.push_str(&format!(
                    "    {}\tvolumes={} free={} max={}\n",
                    node.url, node.volumes, node.free, node.max
                ));
            }
        }
    }
    out
}

/// Ask the master to pre-allocate volumes.
pub async fn run_grow(args: &GrowArgs, client: &WeedClient) -> Result<u8> {
    let req = GrowRequest {
        count: args.count,
        collection: args.collection.clone(),
        replication: args.replication.clone(),
        data_center: args.data_center.clone(),
    };
    client.master().grow(&req).await.context("grow failed")?;
    println!("OK: requested {} volume(s)", args.count);
    Ok(0)
}

/// Ask the master to compact volumes above the garbage threshold.
pub async fn run_vacuum(args: &VacuumArgs, client: &WeedClient) -> Result<u8> {
    if let Some(t) = args.threshold {
        if !(0.0..=1.0).contains(&t) {
            anyhow::bail!("threshold must be between 0 and 1, got {t}");
        }
    }
    client
        .master()
        .vacuum(args.threshold)
        .await
        .context("vacuum failed")?;
    println!("OK: vacuum started");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weedo_client::master::{DataCenter, DataNode, Rack, Topology};

    #[test]
    fn cluster_render_lists_nodes() {
        let status = ClusterStatus {
            version: "3.59".into(),
            topology: Topology {
                free: 3,
                max: 7,
                data_centers: vec![DataCenter {
                    id: "dc1".into(),
                    racks: vec![Rack {
                        id: "rack1".into(),
                        data_nodes: vec![DataNode {
                            url: "127.0.0.1:8080".into(),
                            volumes: 4,
                            free: 3,
                            max: 7,
                            ..DataNode::default()
                        }],
                        ..Rack::default()
                    }],
                    ..DataCenter::default()
                }],
                ..Topology::default()
            },
        };
        assert_eq!(
            render_cluster(&status),
            "version 3.59\nvolumes free=3 max=7\ndc1\n  rack1\n    127.0.0.1:8080\tvolumes=4 free=3 max=7\n"
        );
    }
}
