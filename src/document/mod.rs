//! Document abstraction over the `bson` crate
//!
//! The codec never touches BSON bytes directly. The decoder walks [`Node`]s
//! (documents or arrays, both seen as ordered key/value sequences) and the
//! encoder produces [`Fragment`]s that are placed either under a key or
//! inline into the root document.

use std::borrow::Cow;

use bson::{Bson, Document};

/// An aggregate BSON value viewed as an ordered sequence of elements
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Document(&'a Document),
    Array(&'a [Bson]),
}

impl<'a> Node<'a> {
    /// Number of elements in the node
    pub fn len(&self) -> usize {
        match self {
            Node::Document(doc) => doc.len(),
            Node::Array(items) => items.len(),
        }
    }

    /// Check whether the node holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements in insertion order; array keys are their decimal positions
    pub fn elements(self) -> Elements<'a> {
        match self {
            Node::Document(doc) => Elements::Document(doc.iter()),
            Node::Array(items) => Elements::Array(items.iter().enumerate()),
        }
    }
}

/// Iterator over the `(key, value)` pairs of a [`Node`]
pub enum Elements<'a> {
    Document(bson::document::Iter<'a>),
    Array(std::iter::Enumerate<std::slice::Iter<'a, Bson>>),
}

impl<'a> Iterator for Elements<'a> {
    type Item = (Cow<'a, str>, &'a Bson);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Elements::Document(iter) => iter
                .next()
                .map(|(key, value)| (Cow::Borrowed(key.as_str()), value)),
            Elements::Array(iter) => iter
                .next()
                .map(|(index, value)| (Cow::Owned(index.to_string()), value)),
        }
    }
}

/// Encoded output of one value, not yet attached to a parent
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// A single element: scalar leaf, string, binary blob or null
    Single(Bson),
    /// Several elements forming an array
    Sequence(Vec<Bson>),
    /// The fields of a single record
    Fields(Document),
}

impl Fragment {
    /// Element to store under a key or as an array item
    pub fn into_bson(self) -> Bson {
        match self {
            Fragment::Single(value) => value,
            Fragment::Sequence(items) => Bson::Array(items),
            Fragment::Fields(doc) => Bson::Document(doc),
        }
    }

    /// Root document holding the fragment inline
    ///
    /// Sequences become positional keys of the root; a single element is
    /// stored under `"0"`; record fields become the root's own fields.
    pub fn into_root(self) -> Document {
        match self {
            Fragment::Single(value) => {
                let mut root = Document::new();
                root.insert("0", value);
                root
            }
            Fragment::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, value)| (index.to_string(), value))
                .collect(),
            Fragment::Fields(doc) => doc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_document_elements_keep_keys() {
        let doc = doc! { "a": 1, "b": "x" };
        let keys: Vec<String> = Node::Document(&doc)
            .elements()
            .map(|(key, _)| key.into_owned())
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_array_elements_are_positional() {
        let items = vec![Bson::Int32(4), Bson::Int32(5)];
        let node = Node::Array(&items);
        assert_eq!(node.len(), 2);
        let keys: Vec<String> = node.elements().map(|(key, _)| key.into_owned()).collect();
        assert_eq!(keys, vec!["0", "1"]);
    }

    #[test]
    fn test_fragment_into_root() {
        assert_eq!(
            Fragment::Single(Bson::String("hi".into())).into_root(),
            doc! { "0": "hi" }
        );
        assert_eq!(
            Fragment::Sequence(vec![Bson::Double(1.0), Bson::Double(2.0)]).into_root(),
            doc! { "0": 1.0, "1": 2.0 }
        );
        assert_eq!(
            Fragment::Fields(doc! { "name": "abc" }).into_root(),
            doc! { "name": "abc" }
        );
    }

    #[test]
    fn test_fragment_into_bson() {
        assert_eq!(
            Fragment::Sequence(vec![Bson::Null]).into_bson(),
            Bson::Array(vec![Bson::Null])
        );
        assert_eq!(
            Fragment::Fields(doc! { "a": 1 }).into_bson(),
            Bson::Document(doc! { "a": 1 })
        );
    }
}
