use anyhow::Result;
use estemplate::{DocumentTemplate, IndexTarget};

pub async fn run_get(
    template: &DocumentTemplate,
    cluster: &str,
    index: &str,
    id: &str,
    fields: Option<Vec<String>>,
) -> Result<()> {
    let target = IndexTarget::new(cluster, index);
    match template.get_by_id(&target, id, fields.as_deref()).await? {
        Some(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
        None => anyhow::bail!("Document {} not found in {}/{}", id, cluster, index),
    }
    Ok(())
}

pub async fn run_exists(template: &DocumentTemplate, cluster: &str, index: &str, id: &str) -> Result<()> {
    let target = IndexTarget::new(cluster, index);
    let found = template.exists(&target, id).await?;
    println!("{}", found);
    Ok(())
}

pub async fn run_delete_all(template: &DocumentTemplate, cluster: &str, index: &str) -> Result<()> {
    let target = IndexTarget::new(cluster, index);
    let deleted = template.delete_all(&target).await?;
    println!("Deleted {} documents from {}/{}", deleted, cluster, index);
    Ok(())
}
