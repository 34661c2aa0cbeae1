use crate::domain::label::Label;
use std::str::FromStr;

/// Fields available for sorting labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Wall order: category code, then position inside the category
    Order,
    Name,
    Category,
    ItemCount,
    Created,
    Updated,
}

/// Sort order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "order" => Ok(SortField::Order),
            "name" => Ok(SortField::Name),
            "category" => Ok(SortField::Category),
            "items" => Ok(SortField::ItemCount),
            "created" => Ok(SortField::Created),
            "updated" => Ok(SortField::Updated),
            _ => Err(format!(
                "Invalid sort field '{}'. Valid fields: order, name, category, items, created, updated",
                s
            )),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(format!(
                "Invalid sort order '{}'. Valid orders: asc, desc",
                s
            )),
        }
    }
}

/// Sorts labels in-place by the given field and direction.
///
/// The sort is stable, so labels that compare equal keep their wall order.
///
/// # Examples
/// ```
/// use shelfwise_core::domain::label::{CategoryCode, Label, LabelId};
/// use shelfwise_core::domain::sorting::{sort_labels, SortField, SortOrder};
///
/// let todo = CategoryCode::new("todo").unwrap();
/// let mut labels = vec![
///     Label::new(LabelId::new(1), "Paint".to_string(), todo.clone(), 0),
///     Label::new(LabelId::new(2), "donate".to_string(), todo, 1),
/// ];
///
/// sort_labels(&mut labels, SortField::Name, SortOrder::Ascending);
/// assert_eq!(labels[0].name, "donate");
/// ```
pub fn sort_labels(labels: &mut [Label], field: SortField, order: SortOrder) {
    labels.sort_by(|a, b| {
        let cmp = match field {
            SortField::Order => a
                .category
                .cmp(&b.category)
                .then(a.order.cmp(&b.order)),
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortField::Category => a.category.cmp(&b.category),
            SortField::ItemCount => a.item_count.cmp(&b.item_count),
            SortField::Created => a.created_at.cmp(&b.created_at),
            SortField::Updated => a.updated_at.cmp(&b.updated_at),
        };

        match order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        }
    });
}

/// Returns the labels whose name or description contains `query`, ignoring case
pub fn search_labels<'a>(labels: &'a [Label], query: &str) -> Vec<&'a Label> {
    let query_lower = query.to_lowercase();

    labels
        .iter()
        .filter(|label| {
            let name_matches = label.name.to_lowercase().contains(&query_lower);
            let description_matches = label
                .description
                .as_ref()
                .map(|d| d.to_lowercase().contains(&query_lower))
                .unwrap_or(false);

            name_matches || description_matches
        })
        .collect()
}
