use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::DelveRecord;

#[allow(clippy::cast_precision_loss)]
fn success_rate(records: &[DelveRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let passed = records.iter().filter(|r| r.passed).count();
    (passed as f64 / records.len() as f64) * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    records: &[DelveRecord],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Delve Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "========================".cyan())?;

    let passed = records.iter().filter(|r| r.passed).count();
    writeln!(out, "Total delves: {}", records.len())?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (records.len() - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(records))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for record in records {
        let status = if record.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} seed {}",
            status,
            record.policy.bold(),
            record.seed
        )?;
        writeln!(
            out,
            "   Turns: {} ({} min)  Actions: {}",
            record.turns, record.minutes_elapsed, record.actions
        )?;
        writeln!(
            out,
            "   Encounters: {} (won {}, routed {}, escaped {}, parleyed {})  Obstacles: {}",
            record.encounters,
            record.victories,
            record.monsters_fled,
            record.escapes,
            record.parleys,
            record.obstacles
        )?;
        writeln!(
            out,
            "   Survivors: {}/{}  Banked: {} gp  Torches left: {}",
            record.survivors, record.party_size, record.loot_banked, record.torches_left
        )?;
        if record.wipes > 0 {
            writeln!(out, "   {}", "Party wiped".red())?;
        }
        if !record.violations.is_empty() {
            writeln!(out, "   Violations:")?;
            for violation in &record.violations {
                writeln!(out, "     • {}", violation.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, records: &[DelveRecord]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(records)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, records: &[DelveRecord]) -> Result<()> {
    writeln!(out, "# War Machine Delve Results\n")?;
    let passed = records.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total delves:** {}", records.len())?;
    writeln!(out, "- **Passed:** {passed}")?;
    writeln!(out, "- **Failed:** {}", records.len() - passed)?;
    writeln!(out, "- **Success rate:** {:.1}%\n", success_rate(records))?;

    writeln!(out, "## Delves\n")?;
    writeln!(
        out,
        "| Policy | Seed | Turns | Encounters | Won | Survivors | Banked gp | Status |"
    )?;
    writeln!(
        out,
        "|--------|------|-------|------------|-----|-----------|-----------|--------|"
    )?;
    for record in records {
        let status = if record.passed { "✅ PASS" } else { "❌ FAIL" };
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {}/{} | {} | {} |",
            record.policy,
            record.seed,
            record.turns,
            record.encounters,
            record.victories,
            record.survivors,
            record.party_size,
            record.loot_banked,
            status
        )?;
    }

    let failing: Vec<_> = records.iter().filter(|r| !r.passed).collect();
    if !failing.is_empty() {
        writeln!(out, "\n## Violations\n")?;
        for record in failing {
            writeln!(out, "### {} seed {}\n", record.policy, record.seed)?;
            for violation in &record.violations {
                writeln!(out, "- {violation}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
