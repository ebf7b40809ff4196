//! Prompt construction for plan generation.
//!
//! Pure logic: the same [`PlanInput`] always yields the same prompt text.

use bouquet_db::models::PlanInput;

const OUTPUT_REQUIREMENTS: &str = "\
Output requirements:
- Write in a friendly, practical tone like a real wedding planner.
- Use this structure:

Phase 1: The Big Picture (9-12 Months Before)
1. Vision & Budget
2. Venue & Caterer
3. Photographer
4. DJ & Music

Phase 2: The Details (6-3 Months Before)
1. Vendor Finalization
2. Attire, Invitations, Rentals

Phase 3: Final Countdown (2 Months - Day Of)
1. Headcount & Seating
2. Confirmations
3. Example Day-Of Timeline
";

/// Value of an optional field, or `default` when it is absent or empty.
fn or_default<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v,
        _ => default,
    }
}

/// Build the user prompt sent to the LLM for one plan.
///
/// Missing fields are replaced with readable placeholders ("TBD",
/// "Approx. 100", "Standard wedding vendors") so the model always sees a
/// complete inputs block.
pub fn build_plan_prompt(input: &PlanInput) -> String {
    let couple = or_default(&input.couple_names, "TBD");
    let date = or_default(&input.wedding_date, "TBD");
    let location = or_default(&input.location, "TBD");
    let budget = or_default(&input.budget, "TBD");
    let guests = or_default(&input.guests, "Approx. 100");
    let vendors = or_default(&input.vendors, "Standard wedding vendors");
    let notes = or_default(&input.notes, "");

    let mut prompt = String::with_capacity(1024);

    prompt.push_str("Inputs:\n");
    prompt.push_str(&format!("- Couple Names: {couple}\n"));
    prompt.push_str(&format!("- Target Date: {date}\n"));
    prompt.push_str(&format!("- Location/Venue Preference: {location}\n"));
    prompt.push_str(&format!("- Budget: {budget}\n"));
    prompt.push_str(&format!("- Guest Count: {guests}\n"));
    prompt.push_str(&format!("- Preferred Vendors / Notes: {vendors}, {notes}\n"));
    prompt.push('\n');

    prompt.push_str(OUTPUT_REQUIREMENTS);
    prompt.push('\n');

    prompt.push_str(&format!(
        "Sample Budget Breakdown (tailored to {} and {})\n",
        or_default(&input.budget, "typical budgets"),
        or_default(&input.guests, "guest count"),
    ));
    prompt.push('\n');

    prompt.push_str(&format!(
        "Finish with an encouraging note for {}.\n",
        or_default(&input.couple_names, "the couple")
    ));
    prompt.push_str("Format output as clean text (no markdown fences).\n");

    prompt
}
