// ReflexPod — ADC1 Oneshot Unit
//
// Raw ESP-IDF oneshot driver shared by the piezo and the battery divider.
// Both live on the control thread, so the unit is shared through `Rc`.

use anyhow::Context;
use esp_idf_sys::esp;

pub struct AdcUnit {
    handle: esp_idf_sys::adc_oneshot_unit_handle_t,
}

impl AdcUnit {
    /// Claim ADC1.
    pub fn new() -> anyhow::Result<Self> {
        let mut handle: esp_idf_sys::adc_oneshot_unit_handle_t = core::ptr::null_mut();
        unsafe {
            let unit_cfg = esp_idf_sys::adc_oneshot_unit_init_cfg_t {
                unit_id: esp_idf_sys::adc_unit_t_ADC_UNIT_1,
                ulp_mode: esp_idf_sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                ..core::mem::zeroed()
            };
            esp!(esp_idf_sys::adc_oneshot_new_unit(&unit_cfg, &mut handle)).context("ADC unit init")?;
        }
        Ok(Self { handle })
    }

    /// 12-bit, 11 dB attenuation (0–3.3 V range).
    pub fn configure(&self, channel: u32) -> anyhow::Result<()> {
        let chan_cfg = esp_idf_sys::adc_oneshot_chan_cfg_t {
            atten: esp_idf_sys::adc_atten_t_ADC_ATTEN_DB_11,
            bitwidth: esp_idf_sys::adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        unsafe {
            esp!(esp_idf_sys::adc_oneshot_config_channel(self.handle, channel, &chan_cfg))
                .with_context(|| format!("ADC channel {} config", channel))
        }
    }

    /// One raw 12-bit conversion.
    pub fn read(&self, channel: u32) -> anyhow::Result<u16> {
        let mut raw: i32 = 0;
        unsafe {
            esp!(esp_idf_sys::adc_oneshot_read(self.handle, channel, &mut raw))
                .with_context(|| format!("ADC channel {} read", channel))?;
        }
        Ok(raw.clamp(0, 4095) as u16)
    }
}

impl Drop for AdcUnit {
    fn drop(&mut self) {
        unsafe {
            esp_idf_sys::adc_oneshot_del_unit(self.handle);
        }
    }
}
