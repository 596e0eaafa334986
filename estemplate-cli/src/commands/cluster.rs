use anyhow::Result;
use estemplate::DocumentTemplate;

/// Show every registered cluster with its ping status
pub async fn run_clusters(template: &DocumentTemplate) -> Result<()> {
    let mut names = template.cluster_names();
    names.sort();

    if names.is_empty() {
        println!("No clusters registered");
        return Ok(());
    }

    println!("{:<24} {:<10}", "CLUSTER", "REACHABLE");
    println!("{}", "-".repeat(35));
    for name in names {
        let reachable = template.is_cluster_connected(&name).await;
        println!("{:<24} {:<10}", name, reachable);
    }

    Ok(())
}

pub async fn run_ping(template: &DocumentTemplate, cluster: &str) -> Result<()> {
    if template.is_cluster_connected(cluster).await {
        println!("Cluster {} is reachable", cluster);
        Ok(())
    } else {
        anyhow::bail!("Cluster {} did not answer", cluster);
    }
}
