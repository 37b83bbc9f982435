use sharebin_types::{Blog, Chat, Paste};

/// Anything mirrored from a server collection.
pub trait Document: Clone {
    fn id(&self) -> &str;
    fn owner_id(&self) -> &str;
}

impl Document for Paste {
    fn id(&self) -> &str {
        &self.id
    }
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl Document for Blog {
    fn id(&self) -> &str {
        &self.id
    }
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl Document for Chat {
    fn id(&self) -> &str {
        &self.id
    }
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

/// Ordered local mirror of one server collection, in server order.
#[derive(Debug, Clone)]
pub struct CollectionSlice<T> {
    items: Vec<T>,
}

impl<T> Default for CollectionSlice<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Document> CollectionSlice<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn set_all(&mut self, items: Vec<T>) {
        self.items = items;
    }

    pub fn append(&mut self, item: T) {
        self.items.push(item);
    }

    /// Swaps in the new version at the same position. Unknown ids are ignored.
    pub fn replace(&mut self, item: T) -> bool {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let idx = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(idx))
    }

    /// Drops every item matching `pred`, returning how many went.
    pub fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !pred(item));
        before - self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn paste(id: &str, title: &str) -> Paste {
        Paste {
            id: id.into(),
            title: title.into(),
            content: "content".into(),
            tags: vec![],
            created_at: Utc::now(),
            user_id: "u1".into(),
        }
    }

    #[test]
    fn mutations_keep_order() {
        let mut slice = CollectionSlice::default();
        slice.set_all(vec![paste("a", "one"), paste("b", "two")]);
        slice.append(paste("c", "three"));

        assert!(slice.replace(paste("b", "TWO")));
        assert!(!slice.replace(paste("zz", "ghost")));
        let titles: Vec<_> = slice.items().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["one", "TWO", "three"]);

        assert_eq!(slice.remove("a").map(|p| p.id), Some("a".to_string()));
        assert!(slice.remove("a").is_none());
        assert_eq!(slice.len(), 2);
        assert_eq!(slice.get("c").map(|p| p.owner_id()), Some("u1"));
    }

    #[test]
    fn remove_where_counts() {
        let mut slice = CollectionSlice::default();
        slice.set_all(vec![paste("a", "x"), paste("b", "y"), paste("c", "x")]);
        assert_eq!(slice.remove_where(|p| p.title == "x"), 2);
        assert_eq!(slice.items().len(), 1);
    }
}
