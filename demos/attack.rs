use std::time::Instant;

use mathhammer::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    #[cfg(feature = "parallel")]
    {
        println!("threads = {}", rayon::current_num_threads());
    }

    let attacker = Datasheet::builder()
        .name("Intercessors")
        .models(5)
        .stats(StatBlock::builder().toughness(4).save(3).wounds(2).build())
        .weapon_profiles(vec![
            WeaponProfile::builder()
                .name("Bolt rifle")
                .attacks(DiceSpec::fixed(2))
                .weapon_skill(3)
                .strength(4)
                .armour_penetration(-1)
                .damage(D1)
                .modifiers(WeaponModifiers::builder().sustained_hits(1).build())
                .build(),
            WeaponProfile::builder()
                .name("Plasma pistol")
                .attacks(D3)
                .weapon_skill(3)
                .strength(8)
                .armour_penetration(-3)
                .damage(DiceSpec::fixed(2))
                .modifiers(WeaponModifiers::builder().devastating_wounds(true).build())
                .build(),
        ])
        .modifiers(
            UnitModifiers::builder()
                .reroll_hits(RerollPolicy::Ones)
                .build(),
        )
        .build();
    let defender = Datasheet::builder()
        .name("Terminators")
        .models(5)
        .stats(
            StatBlock::builder()
                .toughness(5)
                .save(2)
                .invulnerable_save(4)
                .wounds(3)
                .build(),
        )
        .build();

    let start = Instant::now();
    let reports = run_calculation(&[attacker], &[defender], &CalcConfig::default())?;
    let elapsed = start.elapsed().as_millis();

    for report in &reports {
        println!(
            "{} ({}) vs {}: {:.2} damage, {:.2} per model",
            report.attacker,
            report.weapon,
            report.defender,
            report.expected_damage,
            report.expected_damage_per_model
        );
        for (name, dist) in report.result.columns() {
            print!("{name:>20} | {:6.2} ±{:5.2} |", dist.mean(), dist.stddev());
            for bucket in dist {
                print!(" {:5.1}%", bucket.at_least * 100.0);
            }
            println!();
        }
        println!();
    }
    println!("elapsed = {elapsed}ms");
    Ok(())
}
