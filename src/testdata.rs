//! Sentence and recording builders shared by unit tests.

pub fn rmc(talker: &str, time: &str, date: &str) -> String {
    format!("${talker}RMC,{time},A,5759.09700,N,01144.34344,E,5.257,28.27,{date},,,A*58")
}

pub fn zda(talker: &str, time: &str, day: u32, month: u32, year: i32) -> String {
    format!("${talker}ZDA,{time},{day:02},{month:02},{year},00,00*6C")
}

pub fn gga(talker: &str, time: &str) -> String {
    format!("${talker}GGA,{time},5759.097,N,01144.343,E,1,08,0.9,10.0,M,40.0,M,,*47")
}

pub fn gll(talker: &str, time: &str) -> String {
    format!("${talker}GLL,5759.097,N,01144.343,E,{time},A,A*5C")
}

/// Wind sentence without a time field
pub fn mwv() -> String {
    "$IIMWV,214.8,R,0.1,K,A*28".to_string()
}

/// AIS position report
pub fn vdm() -> String {
    "!AIVDM,1,1,,A,13aEOK?P00PD2wVMdLDRhgvL289?,0*26".to_string()
}

/// Raw sentences without any time-bearing kind
pub fn no_timestamps(lines: usize) -> String {
    (0..lines)
        .map(|i| if i % 2 == 0 { mwv() } else { vdm() })
        .collect::<Vec<_>>()
        .join("\n")
}

/// GPRMC once per second from 12:00:00 on 2024-01-01, with GPGGA and MWV in between
pub fn one_hertz_rmc(seconds: u32) -> String {
    let mut lines = Vec::new();
    for s in 0..seconds {
        let time = format!("1200{s:02}");
        lines.push(rmc("GP", &time, "010124"));
        lines.push(gga("GP", &time));
        lines.push(mwv());
    }
    lines.join("\n")
}

/// CSV recording, one row per millisecond offset from 2024-03-01T12:00:00Z
pub fn csv_recording(offsets_ms: &[i64]) -> String {
    let mut out = String::from("timestamp,type,id,message\n");
    for (i, ms) in offsets_ms.iter().enumerate() {
        let seconds = ms / 1000;
        let millis = ms % 1000;
        out.push_str(&format!(
            "2024-03-01T12:{:02}:{:02}.{:03}Z,NMEA0183,,\"$IIMWV,{}.0,R,0.1,K,A*28\"\n",
            seconds / 60,
            seconds % 60,
            millis,
            i
        ));
    }
    out
}
