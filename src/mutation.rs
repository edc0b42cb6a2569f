
/*!
This module provides the mutation records used to edit and re-score a template.

A [`Mutation`] is a single-base edit at a zero-based template position; applying an ordered
list of mutations with [`apply_mutations`] yields a new template. [`ScoredMutation`] pairs a
mutation with the score a proposer attached to it.
*/

use simple_error::bail;

use crate::sequence::{is_valid_base, BASES};

/// Enumeration of the single-base edit kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationType {
    /// A new base inserted before the position
    Insertion,
    /// The base at the position removed
    Deletion,
    /// The base at the position replaced
    Substitution
}

/// A single-base edit of a template
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Mutation {
    /// The edit kind
    kind: MutationType,
    /// Zero-based position on the template the mutation refers to
    position: usize,
    /// The new base for insertions and substitutions
    base: Option<u8>
}

impl Mutation {
    /// Creates an insertion of `base` before `position`; `position == template_len` appends.
    pub fn insertion(position: usize, base: u8) -> Mutation {
        Mutation {
            kind: MutationType::Insertion,
            position,
            base: Some(base)
        }
    }

    /// Creates a deletion of the base at `position`.
    pub fn deletion(position: usize) -> Mutation {
        Mutation {
            kind: MutationType::Deletion,
            position,
            base: None
        }
    }

    /// Creates a substitution of the base at `position` with `base`.
    pub fn substitution(position: usize, base: u8) -> Mutation {
        Mutation {
            kind: MutationType::Substitution,
            position,
            base: Some(base)
        }
    }

    /// Attaches a proposer score
    pub fn with_score(self, score: f64) -> ScoredMutation {
        ScoredMutation {
            mutation: self,
            score
        }
    }

    // getters
    pub fn kind(&self) -> MutationType {
        self.kind
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn base(&self) -> Option<u8> {
        self.base
    }

    /// The change in template length this mutation causes
    pub fn length_delta(&self) -> isize {
        match self.kind {
            MutationType::Insertion => 1,
            MutationType::Deletion => -1,
            MutationType::Substitution => 0
        }
    }

    /// Checks that the mutation is applicable to a template of the given length.
    /// # Arguments
    /// * `template_len` - length of the template the position refers to
    /// # Errors
    /// * if the position is outside the domain for the mutation kind
    /// * if an insertion or substitution carries a non-ACGT base
    pub fn check_domain(&self, template_len: usize) -> Result<(), Box<dyn std::error::Error>> {
        let in_domain = match self.kind {
            MutationType::Insertion => self.position <= template_len,
            MutationType::Deletion |
            MutationType::Substitution => self.position < template_len
        };
        if !in_domain {
            bail!("Out of domain: {} on a template of length {}", self, template_len);
        }
        if let Some(base) = self.base {
            if !is_valid_base(base) {
                bail!("Out of domain: mutation base is not ACGT: {:?}", base as char);
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            MutationType::Insertion => {
                write!(f, "Insertion ({}) @{}", self.base.unwrap() as char, self.position)
            },
            MutationType::Deletion => {
                write!(f, "Deletion @{}:{}", self.position, self.position + 1)
            },
            MutationType::Substitution => {
                write!(f, "Substitution ({}) @{}:{}", self.base.unwrap() as char, self.position, self.position + 1)
            }
        }
    }
}

/// A mutation together with the score its proposer attached
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredMutation {
    /// The underlying mutation
    pub mutation: Mutation,
    /// The proposer's score
    pub score: f64
}

impl std::fmt::Display for ScoredMutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:.2}", self.mutation, self.score)
    }
}

/// Applies a list of mutations to a template, producing the new template.
/// Positions refer to the original template: mutations are stable-sorted by position and applied
/// from the end toward the beginning so earlier positions stay valid. Mutations sharing a
/// position therefore apply in reverse submission order.
/// # Arguments
/// * `template` - the template to edit
/// * `mutations` - the edits, positions on `template`
/// # Errors
/// * if any mutation is outside the template domain or carries a non-ACGT base
pub fn apply_mutations(template: &[u8], mutations: &[Mutation]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    for mutation in mutations.iter() {
        mutation.check_domain(template.len())?;
    }

    let mut sorted: Vec<Mutation> = mutations.to_vec();
    sorted.sort_by_key(|m| m.position());

    let mut result = template.to_vec();
    for mutation in sorted.iter().rev() {
        match mutation.kind() {
            MutationType::Insertion => {
                result.insert(mutation.position(), mutation.base().unwrap());
            },
            MutationType::Deletion => {
                result.remove(mutation.position());
            },
            MutationType::Substitution => {
                result[mutation.position()] = mutation.base().unwrap();
            }
        };
    }
    Ok(result)
}

/// Enumerates every single-base mutation of a template: the four insertions, the deletion, and
/// the three substitutions at each position, plus the four insertions at the end. This is the
/// candidate set the polishing driver scores each round.
/// # Arguments
/// * `template` - the template to enumerate over
pub fn all_point_mutations(template: &[u8]) -> Vec<Mutation> {
    let mut result = vec![];
    for (position, &current) in template.iter().enumerate() {
        for &base in BASES.iter() {
            result.push(Mutation::insertion(position, base));
        }
        result.push(Mutation::deletion(position));
        for &base in BASES.iter() {
            if base != current {
                result.push(Mutation::substitution(position, base));
            }
        }
    }
    for &base in BASES.iter() {
        result.push(Mutation::insertion(template.len(), base));
    }
    result
}
