use anyhow::{Context, Result};
use estemplate::query::{Query, SearchSpec};
use estemplate::{DocumentTemplate, IndexTarget, SearchResponse};

#[derive(Debug, Default)]
pub struct SearchOptions {
    pub query: Option<String>,
    pub from: usize,
    pub size: usize,
    pub fields: Option<Vec<String>>,
    pub sort: Option<String>,
    pub scroll: Option<u32>,
}

impl SearchOptions {
    fn to_spec(&self) -> Result<SearchSpec> {
        let query = match &self.query {
            Some(raw) => {
                let value: serde_json::Value =
                    serde_json::from_str(raw).context("Query is not valid JSON")?;
                Query::raw(value)
            }
            None => Query::match_all(),
        };

        let mut spec = SearchSpec::new(query).page(self.from, self.size);
        if let Some(fields) = &self.fields {
            spec = spec.fields(fields.iter().cloned());
        }
        if let Some(sort) = &self.sort {
            spec = spec.sort_by(sort.clone());
        }
        if let Some(minutes) = self.scroll {
            spec = spec.scroll_minutes(minutes);
        }
        Ok(spec)
    }
}

/// Run a search and print hits as JSON lines. With `--scroll`, every page
/// is fetched and the cursor is released at the end.
pub async fn run_search(
    template: &DocumentTemplate,
    cluster: &str,
    index: &str,
    options: SearchOptions,
) -> Result<()> {
    let target = IndexTarget::new(cluster, index);
    let spec = options.to_spec()?;

    let Some(first) = template.search(&target, &spec).await? else {
        anyhow::bail!("Search against {}/{} failed", cluster, index);
    };
    eprintln!("Total hits: {}", first.total());
    let mut printed = print_hits(&first)?;

    let (Some(minutes), Some(scroll_id)) = (options.scroll, first.scroll_id.clone()) else {
        return Ok(());
    };

    while let Some(page) = template.scroll(cluster, &scroll_id, minutes).await? {
        if page.hits.hits.is_empty() {
            break;
        }
        printed += print_hits(&page)?;
    }
    template.clear_scroll(cluster, &scroll_id).await?;
    eprintln!("Printed {} hits", printed);

    Ok(())
}

fn print_hits(response: &SearchResponse) -> Result<usize> {
    for hit in &response.hits.hits {
        println!("{}", serde_json::to_string(hit)?);
    }
    Ok(response.hits.hits.len())
}
