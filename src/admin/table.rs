use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Serialize)]
pub struct Toggleable {
    pub hidden_by_default: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnKind {
    Image {
        width: u32,
        height: u32,
    },
    Text {
        badge: bool,
        date_time: bool,
        since: bool,
        date_time_tooltip: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    /// Attribute path; `relation.attribute` for related models.
    pub name: String,
    pub label: String,
    pub sortable: bool,
    pub searchable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggleable: Option<Toggleable>,
    #[serde(flatten)]
    pub kind: ColumnKind,
}

impl Column {
    fn make(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            sortable: false,
            searchable: false,
            toggleable: None,
            kind,
        }
    }

    #[must_use]
    pub fn image(name: &str) -> Self {
        Self::make(
            name,
            ColumnKind::Image {
                width: 40,
                height: 40,
            },
        )
    }

    #[must_use]
    pub fn text(name: &str) -> Self {
        Self::make(
            name,
            ColumnKind::Text {
                badge: false,
                date_time: false,
                since: false,
                date_time_tooltip: false,
            },
        )
    }

    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    #[must_use]
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    #[must_use]
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    #[must_use]
    pub fn toggleable(mut self, hidden_by_default: bool) -> Self {
        self.toggleable = Some(Toggleable { hidden_by_default });
        self
    }

    #[must_use]
    pub fn size(mut self, w: u32, h: u32) -> Self {
        if let ColumnKind::Image { width, height } = &mut self.kind {
            *width = w;
            *height = h;
        }
        self
    }

    #[must_use]
    pub fn badge(mut self) -> Self {
        if let ColumnKind::Text { badge, .. } = &mut self.kind {
            *badge = true;
        }
        self
    }

    /// Renders as a relative time ("3 days ago") with the full timestamp
    /// in a tooltip.
    #[must_use]
    pub fn since_with_tooltip(mut self) -> Self {
        if let ColumnKind::Text {
            date_time,
            since,
            date_time_tooltip,
            ..
        } = &mut self.kind
        {
            *date_time = true;
            *since = true;
            *date_time_tooltip = true;
        }
        self
    }

    /// Related model the column reads from, if any.
    #[must_use]
    pub fn relation(&self) -> Option<(&str, &str)> {
        self.name.split_once('.')
    }

    #[must_use]
    pub fn hidden_by_default(&self) -> bool {
        self.toggleable.as_ref().is_some_and(|t| t.hidden_by_default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Edit,
    Delete,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkActionGroup {
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DefaultSort {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TableSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<DefaultSort>,
    pub columns: Vec<Column>,
    pub filters: Vec<String>,
    pub actions: Vec<Action>,
    pub bulk_actions: Vec<BulkActionGroup>,
}

impl TableSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn default_sort(mut self, column: &str, direction: SortDirection) -> Self {
        self.default_sort = Some(DefaultSort {
            column: column.to_string(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    #[must_use]
    pub fn bulk_actions(mut self, groups: Vec<BulkActionGroup>) -> Self {
        self.bulk_actions = groups;
        self
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn searchable_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.searchable).collect()
    }

    #[must_use]
    pub fn is_sortable(&self, name: &str) -> bool {
        self.column(name).is_some_and(|c| c.sortable)
    }

    #[must_use]
    pub fn has_bulk_action(&self, action: Action) -> bool {
        self.bulk_actions
            .iter()
            .any(|group| group.actions.contains(&action))
    }
}
