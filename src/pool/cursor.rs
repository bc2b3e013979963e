//! Pool traversal
//!
//! Every traversal gets its own [`Cursor`] or [`Iter`]. Both borrow the
//! pool, so the pool cannot be mutated while one is alive.

use indexmap::map;
use indexmap::IndexMap;
use std::sync::Arc;

/// Explicit position over a pool's connections
///
/// Starts on the first connection. Once [`next`](Self::next) steps past the
/// last one, [`valid`](Self::valid) is false until [`rewind`](Self::rewind)
/// or [`end`](Self::end) repositions it.
pub struct Cursor<'a, C: ?Sized> {
    connections: &'a IndexMap<usize, Arc<C>>,
    /// Position in storage order, `connections.len()` once past the end
    index: usize,
}

impl<'a, C: ?Sized> Cursor<'a, C> {
    pub(crate) fn new(connections: &'a IndexMap<usize, Arc<C>>) -> Self {
        Self {
            connections,
            index: 0,
        }
    }

    /// Move to the first connection
    pub fn rewind(&mut self) {
        self.index = 0;
    }

    /// Move to the last connection
    pub fn end(&mut self) {
        self.index = self.connections.len().saturating_sub(1);
    }

    /// Step to the following connection
    pub fn next(&mut self) {
        if self.index < self.connections.len() {
            self.index += 1;
        }
    }

    /// True while the cursor is on a connection
    pub fn valid(&self) -> bool {
        self.index < self.connections.len()
    }

    /// Key under the cursor
    pub fn key(&self) -> Option<usize> {
        self.connections.get_index(self.index).map(|(k, _)| *k)
    }

    /// Connection under the cursor
    pub fn current(&self) -> Option<&'a Arc<C>> {
        self.connections.get_index(self.index).map(|(_, c)| c)
    }
}

/// Iterator over `(key, connection)` pairs in pool order
pub struct Iter<'a, C: ?Sized> {
    inner: map::Iter<'a, usize, Arc<C>>,
}

impl<'a, C: ?Sized> Iter<'a, C> {
    pub(crate) fn new(inner: map::Iter<'a, usize, Arc<C>>) -> Self {
        Self { inner }
    }
}

impl<'a, C: ?Sized> Iterator for Iter<'a, C> {
    type Item = (usize, &'a Arc<C>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, c)| (*k, c))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<C: ?Sized> DoubleEndedIterator for Iter<'_, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, c)| (*k, c))
    }
}

impl<C: ?Sized> ExactSizeIterator for Iter<'_, C> {}

#[cfg(test)]
mod tests {
    use crate::connection::Connection;
    use crate::pool::testing::FakeConnection;
    use crate::pool::{ConnectionPool, Slot};
    use std::sync::Arc;

    fn pool_of(addresses: &[&str]) -> ConnectionPool<FakeConnection> {
        addresses.iter().map(|a| FakeConnection::arc(a)).collect()
    }

    fn walk(pool: &ConnectionPool<FakeConnection>) -> Vec<(usize, String)> {
        let mut visited = Vec::new();
        let mut cursor = pool.cursor();
        cursor.rewind();
        while cursor.valid() {
            let key = cursor.key().unwrap();
            let conn = cursor.current().unwrap();
            visited.push((key, conn.address().to_string()));
            cursor.next();
        }
        assert!(cursor.current().is_none());
        assert!(cursor.key().is_none());
        visited
    }

    #[test]
    fn cursor_visits_each_connection_once_in_order() {
        let pool = pool_of(&["a:1", "b:2", "c:3"]);
        let visited = walk(&pool);
        assert_eq!(visited.len(), pool.len());
        assert_eq!(
            visited,
            vec![
                (0, "a:1".to_string()),
                (1, "b:2".to_string()),
                (2, "c:3".to_string()),
            ]
        );
    }

    #[test]
    fn cursor_on_empty_pool_is_invalid() {
        let pool: ConnectionPool<FakeConnection> = ConnectionPool::new();
        let mut cursor = pool.cursor();
        assert!(!cursor.valid());
        assert!(cursor.current().is_none());
        cursor.next();
        cursor.end();
        assert!(!cursor.valid());
    }

    #[test]
    fn cursor_skips_gaps() {
        let mut pool = pool_of(&["a:1", "b:2", "c:3", "d:4"]);
        pool.remove(1);
        pool.remove(2);
        pool.set(Slot::At(9), FakeConnection::arc("e:5"));

        let keys: Vec<usize> = walk(&pool).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![0, 3, 9]);
    }

    #[test]
    fn end_follows_insertion_order_on_gapped_pool() {
        let mut pool = pool_of(&["a:1", "b:2", "c:3", "d:4"]);
        pool.remove(1);
        pool.set(Slot::At(1), FakeConnection::arc("late:5"));

        let keys: Vec<usize> = walk(&pool).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![0, 2, 3, 1]);

        let mut cursor = pool.cursor();
        cursor.end();
        assert_eq!(cursor.key(), Some(1));
        assert_eq!(cursor.current().unwrap().address(), "late:5");
        cursor.next();
        assert!(!cursor.valid());
        cursor.next();
        assert!(!cursor.valid());
    }

    #[test]
    fn end_moves_to_last_and_next_exhausts() {
        let pool = pool_of(&["a:1", "b:2", "c:3"]);
        let mut cursor = pool.cursor();
        cursor.end();
        assert_eq!(cursor.key(), Some(2));
        assert_eq!(cursor.current().unwrap().address(), "c:3");

        cursor.next();
        assert!(!cursor.valid());

        cursor.rewind();
        assert_eq!(cursor.key(), Some(0));
    }

    #[test]
    fn nested_cursors_do_not_interfere() {
        let pool = pool_of(&["a:1", "b:2"]);
        let mut pairs = Vec::new();

        let mut outer = pool.cursor();
        while let Some(a) = outer.current() {
            let mut inner = pool.cursor();
            while let Some(b) = inner.current() {
                pairs.push((a.address().to_string(), b.address().to_string()));
                inner.next();
            }
            outer.next();
        }

        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn iter_matches_cursor_order() {
        let mut pool = pool_of(&["a:1", "b:2", "c:3", "d:4"]);
        pool.remove(0);

        let via_iter: Vec<(usize, String)> = (&pool)
            .into_iter()
            .map(|(k, c)| (k, c.address().to_string()))
            .collect();
        assert_eq!(via_iter, walk(&pool));
        assert_eq!(pool.iter().len(), 3);

        let last = pool.iter().next_back().unwrap();
        assert!(Arc::ptr_eq(last.1, pool.get(3).unwrap()));
    }
}
