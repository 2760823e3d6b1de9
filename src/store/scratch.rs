//! Legacy scratch list behind `/todos`: raw strings addressed by position

use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScratchEdit {
    Empty,
    OutOfRange,
    Replaced { previous: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScratchRemoval {
    Empty,
    OutOfRange,
    Removed(String),
}

/// Positions shift after a removal, exactly like a Vec.
#[derive(Debug, Default)]
pub struct ScratchList {
    items: RwLock<Vec<String>>,
}

impl ScratchList {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn items(&self) -> Vec<String> {
        self.items.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub async fn push(&self, item: String) {
        self.items.write().await.push(item);
    }

    pub async fn replace(&self, index: i64, item: String) -> ScratchEdit {
        let mut items = self.items.write().await;
        if items.is_empty() {
            return ScratchEdit::Empty;
        }
        match usize::try_from(index).ok().and_then(|i| items.get_mut(i)) {
            Some(slot) => ScratchEdit::Replaced {
                previous: std::mem::replace(slot, item),
            },
            None => ScratchEdit::OutOfRange,
        }
    }

    pub async fn remove(&self, index: i64) -> ScratchRemoval {
        let mut items = self.items.write().await;
        if items.is_empty() {
            return ScratchRemoval::Empty;
        }
        match usize::try_from(index) {
            Ok(i) if i < items.len() => ScratchRemoval::Removed(items.remove(i)),
            _ => ScratchRemoval::OutOfRange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_and_remove_shift_positions() {
        let list = ScratchList::new();
        list.push("first".into()).await;
        list.push("second".into()).await;

        assert_eq!(list.remove(0).await, ScratchRemoval::Removed("first".into()));
        assert_eq!(list.items().await, vec!["second".to_string()]);
        assert_eq!(list.len().await, 1);
    }

    #[tokio::test]
    async fn test_empty_list_outcomes() {
        let list = ScratchList::new();
        assert!(list.is_empty().await);
        assert_eq!(list.remove(0).await, ScratchRemoval::Empty);
        assert_eq!(list.replace(0, "x".into()).await, ScratchEdit::Empty);
    }

    #[tokio::test]
    async fn test_out_of_range() {
        let list = ScratchList::new();
        list.push("only".into()).await;
        assert_eq!(list.remove(1).await, ScratchRemoval::OutOfRange);
        assert_eq!(list.remove(-1).await, ScratchRemoval::OutOfRange);
        assert_eq!(list.replace(3, "x".into()).await, ScratchEdit::OutOfRange);
    }

    #[tokio::test]
    async fn test_replace() {
        let list = ScratchList::new();
        list.push("old".into()).await;
        assert_eq!(
            list.replace(0, "new".into()).await,
            ScratchEdit::Replaced {
                previous: "old".into()
            }
        );
        assert_eq!(list.items().await, vec!["new".to_string()]);
    }
}
