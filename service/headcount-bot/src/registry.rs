//! Ordered set of work categories and the largest headcount each accepts.

use crate::error::{HeadcountError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub max_value: u32,
}

impl Category {
    pub fn new(name: impl Into<String>, max_value: u32) -> Self {
        Self {
            name: name.into(),
            max_value,
        }
    }

    /// Categories and limits used on the original site.
    pub fn defaults() -> Vec<Category> {
        [
            ("Каркас здания", 3),
            ("Устройство пола", 2),
            ("Кирпичная кладка", 10),
            ("Монтаж лифта", 4),
            ("Отделка", 8),
            ("ОВ ВК", 7),
            ("Монтаж оконных проемов", 2),
            ("Монтаж металлоконструкции", 7),
            ("Кровля", 6),
            ("Фасад", 6),
            ("Электрооборудования", 4),
            ("Система связи", 6),
            ("Оператор автокрана", 2),
            ("Оператор петушок", 1),
            ("Оператор экскаватора/погрузчика", 2),
            ("Петушок", 1),
            ("Автокран", 3),
            ("Экскаватор", 1),
            ("Самосвал", 1),
        ]
        .into_iter()
        .map(|(name, max)| Category::new(name, max))
        .collect()
    }
}

/// Immutable, validated category list. Order is prompt order and column order.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl CategoryRegistry {
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        if categories.is_empty() {
            return Err(HeadcountError::InvalidConfig(
                "at least one category is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for category in &categories {
            if category.name.trim().is_empty() {
                return Err(HeadcountError::InvalidConfig(
                    "category name cannot be empty".into(),
                ));
            }
            if !seen.insert(category.name.as_str()) {
                return Err(HeadcountError::InvalidConfig(format!(
                    "duplicate category `{}`",
                    category.name
                )));
            }
        }

        Ok(Self { categories })
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    pub fn max_for(&self, name: &str) -> Option<u32> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.max_value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// CSV header: the date column followed by every category name.
    pub fn header(&self, date_column: &str) -> Vec<String> {
        std::iter::once(date_column.to_string())
            .chain(self.names().map(str::to_string))
            .collect()
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self {
            categories: Category::defaults(),
        }
    }
}
