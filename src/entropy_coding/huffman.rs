// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::collections::VecDeque;

use crate::bit_reader::BitReader;
use crate::error::{Internal, InvalidInput, Malformed, Result};
use crate::util::tracing_wrappers::*;

/// Longest code length a JPEG Huffman table can describe.
pub const MAX_CODE_LENGTH: usize = 16;
/// Longest code a [`Code`] can hold.
pub const MAX_MAPPED_CODE_LENGTH: usize = 32;
pub const ALPHABET_SIZE: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Leaf(u8),
    /// Bit 0 descends left, bit 1 right. A missing right child marks a code
    /// that is never emitted.
    Inner {
        left: Box<Node>,
        right: Option<Box<Node>>,
    },
}

impl Node {
    fn inner(left: Node, right: Option<Node>) -> Node {
        Node::Inner {
            left: Box::new(left),
            right: right.map(Box::new),
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Inner { left, right } => {
                1 + left.depth().max(right.as_ref().map_or(0, |r| r.depth()))
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Inner { left, right } => {
                left.leaf_count() + right.as_ref().map_or(0, |r| r.leaf_count())
            }
        }
    }
}

/// A frequency-weighted subtree waiting to be merged.
struct Weighted {
    weight: u64,
    node: Node,
}

fn pop_lightest(leaves: &mut VecDeque<Weighted>, nodes: &mut VecDeque<Weighted>) -> Option<Weighted> {
    let take_leaf = match (leaves.front(), nodes.front()) {
        // Leaves win ties, which keeps the tree flat.
        (Some(leaf), Some(node)) => leaf.weight <= node.weight,
        (Some(_), None) => true,
        _ => false,
    };
    if take_leaf {
        leaves.pop_front()
    } else {
        nodes.pop_front()
    }
}

fn combine(first: Weighted, second: Weighted) -> Weighted {
    let weight = first.weight + second.weight;
    let node = match (first.node, second.node) {
        (inner @ Node::Inner { .. }, leaf @ Node::Leaf(_)) => Node::inner(leaf, Some(inner)),
        (left, right) => Node::inner(left, Some(right)),
    };
    Weighted { weight, node }
}

/// Greedy two-queue Huffman construction. Leaves are taken in ascending
/// weight order, ties broken by symbol value.
fn build_greedy(frequencies: &[u64; ALPHABET_SIZE]) -> Result<Node> {
    let mut symbols: Vec<(u64, u8)> = frequencies
        .iter()
        .enumerate()
        .filter(|(_, f)| **f > 0)
        .map(|(symbol, &f)| (f, symbol as u8))
        .collect();
    symbols.sort_by_key(|&(f, _)| f);

    if let [(_, symbol)] = symbols[..] {
        return Ok(Node::inner(Node::Leaf(symbol), None));
    }

    let mut leaves: VecDeque<Weighted> = symbols
        .into_iter()
        .map(|(weight, symbol)| Weighted {
            weight,
            node: Node::Leaf(symbol),
        })
        .collect();
    let mut nodes = VecDeque::new();
    loop {
        let Some(first) = pop_lightest(&mut leaves, &mut nodes) else {
            return Err(InvalidInput::EmptyAlphabet.into());
        };
        let Some(second) = pop_lightest(&mut leaves, &mut nodes) else {
            return Ok(first.node);
        };
        nodes.push_back(combine(first, second));
    }
}

/// Detaches the node at the end of the all-ones path, unless that path ends
/// at `node` itself.
fn detach_rightmost(node: &mut Node) -> Option<Node> {
    let Node::Inner { right, .. } = node else {
        return None;
    };
    let descend = matches!(right.as_deref(), Some(Node::Inner { right: Some(_), .. }));
    if descend {
        right.as_deref_mut().and_then(detach_rightmost)
    } else {
        right.take().map(|child| *child)
    }
}

/// Inner nodes as `(depth of their children, path from the root)`, deepest
/// first; post-order among equal depths.
fn inner_nodes_by_depth(root: &Node) -> Vec<(usize, Vec<bool>)> {
    fn visit(node: &Node, depth: usize, path: &mut Vec<bool>, out: &mut Vec<(usize, Vec<bool>)>) {
        if let Node::Inner { left, right } = node {
            path.push(false);
            visit(left, depth + 1, path, out);
            path.pop();
            if let Some(right) = right {
                path.push(true);
                visit(right, depth + 1, path, out);
                path.pop();
            }
            out.push((depth, path.clone()));
        }
    }
    let mut out = vec![];
    visit(root, 1, &mut vec![], &mut out);
    out.sort_by(|a, b| b.0.cmp(&a.0));
    out
}

fn node_at<'a>(mut node: &'a Node, path: &[bool]) -> Option<&'a Node> {
    for &go_right in path {
        let Node::Inner { left, right } = node else {
            return None;
        };
        node = if go_right { right.as_deref()? } else { &**left };
    }
    Some(node)
}

fn node_at_mut<'a>(mut node: &'a mut Node, path: &[bool]) -> Option<&'a mut Node> {
    for &go_right in path {
        let Node::Inner { left, right } = node else {
            return None;
        };
        node = if go_right {
            right.as_deref_mut()?
        } else {
            &mut **left
        };
    }
    Some(node)
}

/// Moves the leaf at the end of the all-ones path next to another leaf, so
/// that no code consists only of 1 bits. Codes stay within
/// [`MAX_CODE_LENGTH`] bits.
fn reserve_all_ones_code(root: &mut Node) -> Result<()> {
    let Some(detached) = detach_rightmost(root) else {
        return Ok(());
    };

    let tree: &Node = root;
    let target = inner_nodes_by_depth(tree)
        .into_iter()
        .filter(|(depth, _)| *depth < MAX_CODE_LENGTH)
        .find(|(_, path)| {
            matches!(
                node_at(tree, path),
                Some(Node::Inner { left, right: Some(_) }) if matches!(**left, Node::Leaf(_))
            )
        })
        .map(|(_, path)| path);

    match target.and_then(|path| node_at_mut(&mut *root, &path)) {
        Some(Node::Inner { left, .. }) => {
            let sibling = std::mem::replace(&mut **left, Node::Leaf(0));
            **left = Node::inner(sibling, Some(detached));
        }
        _ => {
            // Hang the leaf one level below where it was.
            let mut node = &mut *root;
            loop {
                match node {
                    Node::Inner {
                        right: Some(right), ..
                    } => node = &mut **right,
                    Node::Inner { right, .. } => {
                        *right = Some(Box::new(Node::inner(detached, None)));
                        break;
                    }
                    Node::Leaf(_) => break,
                }
            }
        }
    }

    let depth = root.depth();
    if depth > MAX_CODE_LENGTH {
        return Err(Internal::HuffmanTooDeep(depth).into());
    }
    Ok(())
}

/// A bit pattern of `length` bits, stored in the low bits of `bits`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Code {
    pub bits: u32,
    pub length: u8,
}

/// Symbol to code lookup derived from a tree.
#[derive(Clone, Debug)]
pub struct CodeMap {
    codes: [Option<Code>; ALPHABET_SIZE],
}

impl CodeMap {
    pub fn get(&self, symbol: u8) -> Result<Code> {
        self.codes[symbol as usize].ok_or_else(|| Internal::MissingCode(symbol).into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(symbol, code)| code.map(|c| (symbol as u8, c)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffmanTree {
    /// Always an inner node; a one-symbol tree has the symbol on the left.
    root: Node,
}

pub fn frequencies(data: &[u8]) -> [u64; ALPHABET_SIZE] {
    let mut frequencies = [0u64; ALPHABET_SIZE];
    for &b in data {
        frequencies[b as usize] += 1;
    }
    frequencies
}

impl HuffmanTree {
    /// Plain Huffman tree over the byte frequencies of `data`, with no depth
    /// limit.
    pub fn build(data: &[u8]) -> Result<HuffmanTree> {
        Self::from_frequencies(&frequencies(data))
    }

    pub fn from_frequencies(frequencies: &[u64; ALPHABET_SIZE]) -> Result<HuffmanTree> {
        Ok(HuffmanTree {
            root: build_greedy(frequencies)?,
        })
    }

    /// Tree usable in a JPEG DHT segment: at most [`MAX_CODE_LENGTH`] bits per
    /// code, no all-ones code, and canonical shape.
    pub fn build_jpeg(data: &[u8]) -> Result<HuffmanTree> {
        Self::jpeg_from_frequencies(&frequencies(data))
    }

    pub fn jpeg_from_frequencies(frequencies: &[u64; ALPHABET_SIZE]) -> Result<HuffmanTree> {
        let mut frequencies = *frequencies;
        let mut root = build_greedy(&frequencies)?;
        while root.depth() > MAX_CODE_LENGTH {
            debug!(depth = root.depth(), "halving Huffman frequencies");
            for f in frequencies.iter_mut() {
                *f = f.div_ceil(2);
            }
            root = build_greedy(&frequencies)?;
        }
        reserve_all_ones_code(&mut root)?;
        HuffmanTable::from_tree(&HuffmanTree { root })?.to_tree()
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn code_map(&self) -> Result<CodeMap> {
        fn visit(node: &Node, code: Code, codes: &mut [Option<Code>; ALPHABET_SIZE]) -> Result<()> {
            match node {
                Node::Leaf(symbol) => codes[*symbol as usize] = Some(code),
                Node::Inner { left, right } => {
                    if code.length as usize == MAX_MAPPED_CODE_LENGTH {
                        return Err(Internal::HuffmanTooDeep(MAX_MAPPED_CODE_LENGTH + 1).into());
                    }
                    let length = code.length + 1;
                    visit(left, Code { bits: code.bits << 1, length }, codes)?;
                    if let Some(right) = right {
                        let bits = (code.bits << 1) | 1;
                        visit(right, Code { bits, length }, codes)?;
                    }
                }
            }
            Ok(())
        }
        let mut codes = [None; ALPHABET_SIZE];
        visit(&self.root, Code { bits: 0, length: 0 }, &mut codes)?;
        Ok(CodeMap { codes })
    }

    /// Walks the tree one bit at a time until it reaches a leaf.
    pub fn read_symbol(&self, br: &mut BitReader) -> Result<u8> {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(symbol) => return Ok(*symbol),
                Node::Inner { left, right } => {
                    node = if br.read_bit()? {
                        right.as_deref().ok_or(Malformed::MissingRightChild)?
                    } else {
                        &**left
                    };
                }
            }
        }
    }
}

/// Canonical form of a code: the symbols of each code length, in code order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HuffmanTable {
    /// `by_length[i]` holds the symbols with `i + 1`-bit codes.
    by_length: [Vec<u8>; MAX_CODE_LENGTH],
}

impl HuffmanTable {
    /// Reads symbols level by level, left to right.
    pub fn from_tree(tree: &HuffmanTree) -> Result<HuffmanTable> {
        let mut table = HuffmanTable::default();
        let mut queue = VecDeque::from([(0usize, &tree.root)]);
        while let Some((depth, node)) = queue.pop_front() {
            match node {
                Node::Leaf(symbol) => {
                    if depth > MAX_CODE_LENGTH {
                        return Err(Internal::HuffmanTooDeep(depth).into());
                    }
                    table.by_length[depth - 1].push(*symbol);
                }
                Node::Inner { left, right } => {
                    queue.push_back((depth + 1, &**left));
                    if let Some(right) = right {
                        queue.push_back((depth + 1, &**right));
                    }
                }
            }
        }
        Ok(table)
    }

    /// Builds a table from DHT `counts` (codes per length 1..=16) and the
    /// concatenated symbol list.
    pub fn from_counts(counts: &[u8; MAX_CODE_LENGTH], values: &[u8]) -> Result<HuffmanTable> {
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        if total != values.len() || total > ALPHABET_SIZE {
            return Err(Malformed::TooManySymbols(total).into());
        }
        let mut table = HuffmanTable::default();
        let mut values = values.iter().copied();
        for (symbols, &count) in table.by_length.iter_mut().zip(counts.iter()) {
            symbols.extend(values.by_ref().take(count as usize));
        }
        // Kraft inequality, in units of 2^-16.
        let space: u32 = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (c as u32) << (MAX_CODE_LENGTH - 1 - i))
            .sum();
        if space > 1 << MAX_CODE_LENGTH {
            return Err(Malformed::InvalidHuffmanTable.into());
        }
        Ok(table)
    }

    pub fn counts(&self) -> [u8; MAX_CODE_LENGTH] {
        array_init::array_init(|i| self.by_length[i].len() as u8)
    }

    pub fn values(&self) -> Vec<u8> {
        self.by_length.concat()
    }

    pub fn symbol_count(&self) -> usize {
        self.by_length.iter().map(Vec::len).sum()
    }

    /// Rebuilds a tree bottom-up. Each level's symbols take the leftmost
    /// positions; nodes carried up from the level below are paired after them.
    pub fn to_tree(&self) -> Result<HuffmanTree> {
        let mut carried: Vec<Node> = vec![];
        for symbols in self.by_length.iter().rev() {
            let mut level: Vec<Node> = symbols.iter().map(|&s| Node::Leaf(s)).collect();
            let mut below = carried.into_iter();
            while let Some(left) = below.next() {
                level.push(Node::inner(left, below.next()));
            }
            carried = level;
        }
        let mut top = carried.into_iter();
        match (top.next(), top.next(), top.len()) {
            (None, _, _) => Err(InvalidInput::EmptyAlphabet.into()),
            (Some(left), right, 0) => Ok(HuffmanTree {
                root: Node::inner(left, right),
            }),
            (_, _, extra) => {
                warn!(extra, "Huffman code lengths oversubscribe the code space");
                Err(Malformed::InvalidHuffmanTable.into())
            }
        }
    }
}

/// Packs the codes of `data` MSB-first into 32-bit words. The final word is
/// zero-padded.
pub fn encode(tree: &HuffmanTree, data: &[u8]) -> Result<Vec<u32>> {
    let map = tree.code_map()?;
    let mut words = vec![];
    let mut current = 0u32;
    let mut used = 0usize;
    for &symbol in data {
        let code = map.get(symbol)?;
        let mut remaining = code.length as usize;
        while remaining > 0 {
            let free = 32 - used;
            let take = remaining.min(free);
            let chunk = ((code.bits as u64 >> (remaining - take)) & ((1u64 << take) - 1)) as u32;
            current |= ((chunk as u64) << (free - take)) as u32;
            used += take;
            remaining -= take;
            if used == 32 {
                words.push(current);
                current = 0;
                used = 0;
            }
        }
    }
    if used > 0 {
        words.push(current);
    }
    Ok(words)
}

/// Decodes `count` symbols from words produced by [`encode`].
pub fn decode(words: &[u32], count: usize, tree: &HuffmanTree) -> Result<Vec<u8>> {
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
    let mut br = BitReader::new(&bytes);
    (0..count).map(|_| tree.read_symbol(&mut br)).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use test_log::test;

    const RAIN: &[u8] = b"The rain in Spain falls mainly in the plain.";

    fn assert_jpeg_compatible(tree: &HuffmanTree) -> Result<()> {
        assert!(tree.depth() <= MAX_CODE_LENGTH);
        for (symbol, code) in tree.code_map()?.iter() {
            assert!(code.length >= 1);
            assert_ne!(
                code.bits,
                (1u32 << code.length) - 1,
                "symbol {symbol} has an all-ones code"
            );
        }
        Ok(())
    }

    #[test]
    fn plain_tree_packs_words() -> Result<()> {
        let tree = HuffmanTree::build(RAIN)?;
        let words = encode(&tree, RAIN)?;
        assert_eq!(
            words,
            vec![
                0b00110000011111110011010101001011,
                0b10100101110001010001010100101110,
                0b00111010111011100111011001100010,
                0b10010111101111011010010111001111,
                0b00001111111000011110010100101001,
                0b00000000000000000000000000000000,
            ]
        );
        assert_eq!(decode(&words, RAIN.len(), &tree)?, RAIN);
        Ok(())
    }

    #[test]
    fn jpeg_tree_round_trip() -> Result<()> {
        let tree = HuffmanTree::build_jpeg(RAIN)?;
        assert_eq!(tree.root().leaf_count(), 17);
        assert_jpeg_compatible(&tree)?;
        let words = encode(&tree, RAIN)?;
        assert_eq!(decode(&words, RAIN.len(), &tree)?, RAIN);
        Ok(())
    }

    #[test]
    fn table_round_trip_is_idempotent() -> Result<()> {
        let tree = HuffmanTree::build_jpeg(RAIN)?;
        let table = HuffmanTable::from_tree(&tree)?;
        assert_eq!(table.symbol_count(), 17);
        assert_eq!(table.to_tree()?, tree);
        let wire = HuffmanTable::from_counts(&table.counts(), &table.values())?;
        assert_eq!(wire, table);
        Ok(())
    }

    #[test]
    fn standard_dc_luminance_codes() -> Result<()> {
        let counts = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
        let values: Vec<u8> = (0..12).collect();
        let tree = HuffmanTable::from_counts(&counts, &values)?.to_tree()?;
        let map = tree.code_map()?;
        let expected = [
            (0b00, 2),
            (0b010, 3),
            (0b011, 3),
            (0b100, 3),
            (0b101, 3),
            (0b110, 3),
            (0b1110, 4),
            (0b11110, 5),
            (0b111110, 6),
            (0b1111110, 7),
            (0b11111110, 8),
            (0b111111110, 9),
        ];
        for (symbol, (bits, length)) in expected.into_iter().enumerate() {
            assert_eq!(map.get(symbol as u8)?, Code { bits, length });
        }
        Ok(())
    }

    #[test]
    fn skewed_frequencies_are_flattened() -> Result<()> {
        let mut frequencies = [0u64; ALPHABET_SIZE];
        let (mut a, mut b) = (1u64, 1u64);
        for f in frequencies.iter_mut().take(30) {
            *f = a;
            (a, b) = (b, a + b);
        }
        assert!(HuffmanTree::from_frequencies(&frequencies)?.depth() > MAX_CODE_LENGTH);
        let tree = HuffmanTree::jpeg_from_frequencies(&frequencies)?;
        assert_eq!(tree.root().leaf_count(), 30);
        assert_jpeg_compatible(&tree)
    }

    #[test]
    fn single_symbol() -> Result<()> {
        let tree = HuffmanTree::build_jpeg(&[7, 7, 7])?;
        assert_eq!(tree.code_map()?.get(7)?, Code { bits: 0, length: 1 });
        assert_eq!(HuffmanTable::from_tree(&tree)?.counts()[0], 1);
        let words = encode(&tree, &[7, 7, 7])?;
        assert_eq!(words, vec![0]);
        assert_eq!(
            decode(&[0x8000_0000], 1, &tree),
            Err(Error::Malformed(Malformed::MissingRightChild))
        );
        Ok(())
    }

    #[test]
    fn unknown_symbol_is_an_error() -> Result<()> {
        let tree = HuffmanTree::build(b"abc")?;
        assert_eq!(
            encode(&tree, b"abd"),
            Err(Error::Internal(Internal::MissingCode(b'd')))
        );
        Ok(())
    }

    #[test]
    fn empty_alphabet() {
        assert!(matches!(
            HuffmanTree::build(&[]),
            Err(Error::InvalidInput(InvalidInput::EmptyAlphabet))
        ));
        assert!(HuffmanTable::default().to_tree().is_err());
    }

    #[test]
    fn oversubscribed_counts_are_rejected() {
        let mut counts = [0u8; MAX_CODE_LENGTH];
        counts[0] = 3;
        assert_eq!(
            HuffmanTable::from_counts(&counts, &[1, 2, 3]),
            Err(Error::Malformed(Malformed::InvalidHuffmanTable))
        );
        assert!(HuffmanTable::from_counts(&counts, &[1, 2]).is_err());
    }

    #[test]
    fn arbitrary_data_round_trips() {
        arbtest::arbtest(|u| {
            let data: Vec<u8> = u.arbitrary()?;
            if data.is_empty() {
                return Ok(());
            }
            let plain = HuffmanTree::build(&data).unwrap();
            if plain.depth() <= MAX_MAPPED_CODE_LENGTH {
                let words = encode(&plain, &data).unwrap();
                assert_eq!(decode(&words, data.len(), &plain).unwrap(), data);
            }

            let tree = HuffmanTree::build_jpeg(&data).unwrap();
            assert_jpeg_compatible(&tree).unwrap();
            let words = encode(&tree, &data).unwrap();
            let table = HuffmanTable::from_tree(&tree).unwrap();
            let rebuilt = HuffmanTable::from_counts(&table.counts(), &table.values())
                .unwrap()
                .to_tree()
                .unwrap();
            assert_eq!(decode(&words, data.len(), &rebuilt).unwrap(), data);
            Ok(())
        });
    }
}
