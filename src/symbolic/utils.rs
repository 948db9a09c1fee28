/// Index of the bracket closing the one opened at `bracket_start`, if any.
pub fn find_pair_to_this_bracket(input: &str, bracket_start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in input.char_indices().skip_while(|(i, _)| *i < bracket_start) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// True when the whole string is one bracketed group, e.g. "(a+b)" but not "(a)+(b)".
pub fn wrapped_in_brackets(input: &str) -> bool {
    input.starts_with('(') && find_pair_to_this_bracket(input, 0) == Some(input.len() - 1)
}

/// Byte positions of characters at bracket depth zero, in order.
pub fn positions_outside_brackets(input: &str) -> Vec<(usize, char)> {
    let mut depth: i32 = 0;
    let mut out = Vec::new();
    for (i, c) in input.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            _ if depth == 0 => out.push((i, c)),
            _ => {}
        }
    }
    out
}

/// Splits at commas lying outside any bracket.
pub fn split_outside_brackets(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in positions_outside_brackets(input) {
        if c == separator {
            parts.push(&input[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}

pub fn linspace(start: f64, end: f64, num_values: usize) -> Vec<f64> {
    if num_values < 2 {
        return vec![start; num_values];
    }
    let step = (end - start) / (num_values as f64 - 1.0);
    (0..num_values).map(|i| start + step * i as f64).collect()
}

/// Central-difference estimate of f'(0) for a fallible f.
pub fn numerical_derivative<F, E>(f: F, h: f64) -> Result<f64, E>
where
    F: Fn(f64) -> Result<f64, E>,
{
    Ok((f(h)? - f(-h)?) / (2.0 * h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brackets() {
        assert_eq!(find_pair_to_this_bracket("(a+(b))*c", 0), Some(6));
        assert_eq!(find_pair_to_this_bracket("(a+(b))*c", 3), Some(5));
        assert_eq!(find_pair_to_this_bracket("(a", 0), None);
        assert!(wrapped_in_brackets("(a+b)"));
        assert!(!wrapped_in_brackets("(a)+(b)"));
    }

    #[test]
    fn test_split() {
        assert_eq!(split_outside_brackets("a, min(b, c)", ','), vec!["a", " min(b, c)"]);
    }

    #[test]
    fn test_linspace_and_derivative() {
        assert_eq!(linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
        let d: Result<f64, ()> = numerical_derivative(|h| Ok((1.0 + h) * (1.0 + h)), 1e-6);
        assert!((d.unwrap() - 2.0).abs() < 1e-6);
    }
}
