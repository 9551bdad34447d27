use color_eyre::eyre::{eyre, WrapErr};

/// Parses a comma-separated list of variables and inclusive ranges, e.g. `1-4,7,10-8`.
pub fn parse_comma_separated_intervals(input: &str) -> color_eyre::Result<Vec<u32>> {
    let mut result = Vec::new();
    for part in input.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let parse = |s: &str| -> color_eyre::Result<u32> {
            let var: u32 = s.trim().parse().wrap_err_with(|| format!("Bad variable '{}'", s))?;
            if var == 0 {
                return Err(eyre!("Variables are 1-based, got 0"));
            }
            Ok(var)
        };
        match part.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (parse(start)?, parse(end)?);
                if start <= end {
                    result.extend(start..=end);
                } else {
                    result.extend((end..=start).rev());
                }
            }
            None => result.push(parse(part)?),
        }
    }
    Ok(result)
}
